//! CRM pipeline: leads, notes, tasks and the stats rollup.

use chrono::NaiveDate;
use portal_core::types::{
    LeadFilter, LeadPatch, LeadSource, LeadStats, LeadStatus, LeadTaskPatch, NewLead, NewLeadTask,
};
use portal_core::{ActorContext, PortalError, WorkflowService};
use uuid::Uuid;

fn lead(name: &str, status: Option<LeadStatus>) -> NewLead {
    NewLead {
        full_name: name.to_string(),
        status,
        ..NewLead::default()
    }
}

#[tokio::test]
async fn jane_doe_end_to_end() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());

    let created = svc.create_lead(&pro, lead("Jane Doe", None)).await.unwrap();
    assert_eq!(created.status, LeadStatus::New);
    assert_eq!(created.lead_source, LeadSource::ManualEntry);
    assert!(created.email.is_none());
    assert!(created.phone.is_none());

    svc.update_lead(
        &pro,
        created.lead_id,
        LeadPatch {
            status: Some(LeadStatus::Contacted),
            ..LeadPatch::default()
        },
    )
    .await
    .unwrap();

    svc.add_lead_note(&pro, created.lead_id, "Left voicemail").await.unwrap();

    let due = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
    let task = svc
        .add_lead_task(
            &pro,
            created.lead_id,
            NewLeadTask {
                title: "Follow up".to_string(),
                due_date: Some(due),
                ..NewLeadTask::default()
            },
        )
        .await
        .unwrap();
    assert!(!task.completed);

    let done = svc.set_lead_task_completed(&pro, task.task_id, true).await.unwrap();
    assert!(done.completed);
    assert!(done.completed_at.is_some());

    let detail = svc.get_lead_detail(&pro, created.lead_id).await.unwrap();
    assert_eq!(detail.lead.full_name, "Jane Doe");
    assert_eq!(detail.lead.status, LeadStatus::Contacted);
    assert_eq!(detail.notes.len(), 1);
    assert_eq!(detail.notes[0].content, "Left voicemail");
    assert_eq!(detail.tasks.len(), 1);
    assert!(detail.tasks[0].completed);
    assert_eq!(detail.tasks[0].due_date, Some(due));
}

#[tokio::test]
async fn stats_match_direct_counts() {
    let svc = WorkflowService::in_memory();
    let owner_id = Uuid::new_v4();
    let pro = ActorContext::professional(owner_id);

    for (name, status) in [
        ("A", LeadStatus::New),
        ("B", LeadStatus::Contacted),
        ("C", LeadStatus::ClosedWon),
    ] {
        svc.create_lead(&pro, lead(name, Some(status))).await.unwrap();
    }

    let stats = svc.lead_stats(&pro, owner_id).await.unwrap();
    assert_eq!(
        stats,
        LeadStats {
            total: 3,
            new: 1,
            active: 1,
            closed_won: 1,
            closed_lost: 0,
        }
    );

    for status in LeadStatus::ALL {
        let filtered = svc
            .list_leads(&pro, &LeadFilter { status: Some(status) })
            .await
            .unwrap();
        assert!(filtered.iter().all(|l| l.status == status));
        let counted = svc
            .lead_status_counts(&pro, owner_id)
            .await
            .unwrap()
            .into_iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| n)
            .unwrap();
        assert_eq!(filtered.len() as i64, counted, "{}", status.as_str());
    }
}

#[tokio::test]
async fn leads_are_private_to_their_owner() {
    let svc = WorkflowService::in_memory();
    let owner = ActorContext::professional(Uuid::new_v4());
    let other = ActorContext::professional(Uuid::new_v4());
    let admin = ActorContext::admin(Uuid::new_v4());
    let created = svc.create_lead(&owner, lead("Private Person", None)).await.unwrap();

    for ctx in [&other, &admin] {
        let err = svc.get_lead(ctx, created.lead_id).await.unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
        assert!(svc.list_leads(ctx, &LeadFilter::default()).await.unwrap().is_empty());
        assert!(matches!(
            svc.add_lead_note(ctx, created.lead_id, "snooping").await,
            Err(PortalError::Forbidden(_))
        ));
    }
    assert!(matches!(
        svc.lead_stats(&other, created.owner_id).await,
        Err(PortalError::Forbidden(_))
    ));
    assert!(matches!(
        svc.create_lead(&ActorContext::anonymous(), lead("Nobody", None)).await,
        Err(PortalError::Forbidden(_))
    ));
}

#[tokio::test]
async fn any_status_may_follow_any_other() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let created = svc
        .create_lead(&pro, lead("Loop", Some(LeadStatus::ClosedWon)))
        .await
        .unwrap();

    let reopened = svc
        .update_lead(
            &pro,
            created.lead_id,
            LeadPatch {
                status: Some(LeadStatus::New),
                email: Some("loop@example.com".to_string()),
                ..LeadPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reopened.status, LeadStatus::New);
    assert_eq!(reopened.email.as_deref(), Some("loop@example.com"));
    assert_eq!(reopened.owner_id, created.owner_id);

    // Empty string clears the field.
    let cleared = svc
        .update_lead(
            &pro,
            created.lead_id,
            LeadPatch {
                email: Some(String::new()),
                ..LeadPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.email.is_none());
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let mut new = lead("Bad Email", None);
    new.email = Some("not-an-email".to_string());

    let err = svc.create_lead(&pro, new).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn tasks_sort_by_due_date_with_undated_last() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let created = svc.create_lead(&pro, lead("Busy", None)).await.unwrap();

    for (title, due) in [
        ("undated", None),
        ("later", NaiveDate::from_ymd_opt(2026, 12, 1)),
        ("sooner", NaiveDate::from_ymd_opt(2026, 11, 1)),
    ] {
        svc.add_lead_task(
            &pro,
            created.lead_id,
            NewLeadTask {
                title: title.to_string(),
                due_date: due,
                ..NewLeadTask::default()
            },
        )
        .await
        .unwrap();
    }

    let titles: Vec<String> = svc
        .list_lead_tasks(&pro, created.lead_id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["sooner", "later", "undated"]);
}

#[tokio::test]
async fn reopening_a_task_clears_completed_at() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let created = svc.create_lead(&pro, lead("Reopen", None)).await.unwrap();
    let task = svc
        .add_lead_task(
            &pro,
            created.lead_id,
            NewLeadTask {
                title: "Call back".to_string(),
                ..NewLeadTask::default()
            },
        )
        .await
        .unwrap();

    svc.set_lead_task_completed(&pro, task.task_id, true).await.unwrap();
    let reopened = svc.set_lead_task_completed(&pro, task.task_id, false).await.unwrap();
    assert!(!reopened.completed);
    assert!(reopened.completed_at.is_none());

    svc.delete_lead_task(&pro, task.task_id).await.unwrap();
    assert!(svc.list_lead_tasks(&pro, created.lead_id).await.unwrap().is_empty());
    assert!(matches!(
        svc.delete_lead_task(&pro, task.task_id).await,
        Err(PortalError::NotFound(_))
    ));
}

#[tokio::test]
async fn task_due_date_can_be_moved_and_cleared() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let created = svc.create_lead(&pro, lead("Flexible", None)).await.unwrap();
    let task = svc
        .add_lead_task(
            &pro,
            created.lead_id,
            NewLeadTask {
                title: "Send proposal".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 11, 2),
                ..NewLeadTask::default()
            },
        )
        .await
        .unwrap();

    let retitled = svc
        .update_lead_task(
            &pro,
            task.task_id,
            LeadTaskPatch {
                title: Some("Send revised proposal".to_string()),
                ..LeadTaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retitled.due_date, NaiveDate::from_ymd_opt(2026, 11, 2));

    let moved = svc
        .update_lead_task(
            &pro,
            task.task_id,
            LeadTaskPatch {
                due_date: Some(NaiveDate::from_ymd_opt(2026, 11, 9)),
                ..LeadTaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.due_date, NaiveDate::from_ymd_opt(2026, 11, 9));

    let cleared = svc
        .update_lead_task(
            &pro,
            task.task_id,
            LeadTaskPatch {
                due_date: Some(None),
                ..LeadTaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.due_date.is_none());
    assert_eq!(cleared.title, "Send revised proposal");
}

#[tokio::test]
async fn deleting_a_lead_removes_its_children() {
    let svc = WorkflowService::in_memory();
    let pro = ActorContext::professional(Uuid::new_v4());
    let created = svc.create_lead(&pro, lead("Gone", None)).await.unwrap();
    svc.add_lead_note(&pro, created.lead_id, "first call").await.unwrap();
    let task = svc
        .add_lead_task(
            &pro,
            created.lead_id,
            NewLeadTask {
                title: "Send brochure".to_string(),
                ..NewLeadTask::default()
            },
        )
        .await
        .unwrap();

    svc.delete_lead(&pro, created.lead_id).await.unwrap();

    assert!(matches!(
        svc.get_lead(&pro, created.lead_id).await,
        Err(PortalError::NotFound(_))
    ));
    assert!(matches!(
        svc.set_lead_task_completed(&pro, task.task_id, true).await,
        Err(PortalError::NotFound(_))
    ));
    assert_eq!(svc.lead_stats(&pro, created.owner_id).await.unwrap().total, 0);
}
