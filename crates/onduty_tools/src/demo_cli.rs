#![forbid(unsafe_code)]

//! Operator-facing demo commands: seed a small in-memory world and print the
//! dashboard queries as JSON, for eyeballing index behavior without the HTTP
//! layer.

use std::collections::BTreeSet;

use serde_json::json;

use onduty_contracts::{
    ApprovalRequest, DaySession, PeriodMarker, RequestId, ReviewDecision, ReviewRole,
    ReviewVerdict, Reviewer, ReviewerId, Subject, SubjectId, UnixTimeMs,
};
use onduty_index::{IndexConfig, IndexManager, DEFAULT_HISTORY_CAPACITY as PER_PERIOD_CAP};
use onduty_storage::DutyStore;

pub struct DemoWorld {
    pub store: DutyStore,
    pub manager: IndexManager,
}

/// Seeds two students and one mentor-advisor pair, pushes a handful of
/// requests through the manager's write path, and settles one of them.
pub fn build_demo_world() -> Result<DemoWorld, String> {
    let mut store = DutyStore::new_in_memory();

    let sem4 = PeriodMarker::new("sem4").map_err(fmt_err)?;
    let sem3 = PeriodMarker::new("sem3").map_err(fmt_err)?;

    for (id, name, priors) in [
        ("stu_asha", "Asha Rao", vec![sem3.clone()]),
        ("stu_vikram", "Vikram Shah", Vec::new()),
    ] {
        store
            .upsert_subject_row(
                Subject::v1(
                    SubjectId::new(id).map_err(fmt_err)?,
                    name.to_string(),
                    sem4.clone(),
                    priors,
                )
                .map_err(fmt_err)?,
            )
            .map_err(fmt_err)?;
    }

    store
        .upsert_reviewer_row(
            Reviewer::v1(
                ReviewerId::new("rev_iyer").map_err(fmt_err)?,
                "Prof. Iyer".to_string(),
                BTreeSet::from([SubjectId::new("stu_asha").map_err(fmt_err)?]),
                BTreeSet::from([
                    SubjectId::new("stu_asha").map_err(fmt_err)?,
                    SubjectId::new("stu_vikram").map_err(fmt_err)?,
                ]),
            )
            .map_err(fmt_err)?,
        )
        .map_err(fmt_err)?;

    let mut manager = IndexManager::new(IndexConfig::mvp_v1());
    manager.initialize_from_repo(&store);

    let day_ms = 86_400_000u64;
    for (n, (subject, justification)) in [
        ("stu_asha", "district robotics meet"),
        ("stu_asha", "blood donation camp volunteering"),
        ("stu_vikram", "inter-college sports duty"),
    ]
    .iter()
    .enumerate()
    {
        let start = 1_760_000_000_000 + n as u64 * day_ms;
        let record = ApprovalRequest::v1(
            RequestId::new(format!("req_{:03}", n + 1)).map_err(fmt_err)?,
            SubjectId::new(*subject).map_err(fmt_err)?,
            sem4.clone(),
            UnixTimeMs(start),
            DaySession::Am,
            UnixTimeMs(start + day_ms),
            DaySession::Pm,
            (*justification).to_string(),
            Vec::new(),
            UnixTimeMs(start - 10_000),
        )
        .map_err(fmt_err)?;
        manager.insert_request(&mut store, record).map_err(fmt_err)?;
    }

    // req_001 goes through both approval stages.
    for (role, t) in [
        (ReviewRole::Primary, 1_760_200_000_000u64),
        (ReviewRole::Secondary, 1_760_300_000_000),
    ] {
        manager
            .update_status(
                &mut store,
                &RequestId::new("req_001").map_err(fmt_err)?,
                ReviewDecision::v1(role, ReviewVerdict::Approved, None, UnixTimeMs(t))
                    .map_err(fmt_err)?,
            )
            .map_err(fmt_err)?;
    }

    Ok(DemoWorld { store, manager })
}

pub fn execute_demo_command(
    world: &DemoWorld,
    subcommand: &str,
    args: &[String],
) -> Result<String, String> {
    match subcommand {
        "dashboard" => render_dashboard(world),
        "quota" => {
            let subject = args
                .first()
                .ok_or_else(|| "usage: onduty quota <subject_id> <period>".to_string())?;
            let period = args
                .get(1)
                .ok_or_else(|| "usage: onduty quota <subject_id> <period>".to_string())?;
            render_quota(world, subject, period)
        }
        _ => Err("usage: onduty <dashboard|quota> [args]".to_string()),
    }
}

fn render_dashboard(world: &DemoWorld) -> Result<String, String> {
    let asha = SubjectId::new("stu_asha").map_err(fmt_err)?;
    let sem4 = PeriodMarker::new("sem4").map_err(fmt_err)?;
    let iyer = ReviewerId::new("rev_iyer").map_err(fmt_err)?;

    let payload = json!({
        "subject_history": {
            "subject_id": asha.as_str(),
            "period": sem4.as_str(),
            "requests": world.manager.subject_history(&asha, &sem4).map_err(fmt_err)?,
        },
        "primary_group": world.manager.primary_group_history(&iyer).map_err(fmt_err)?,
        "secondary_group": world.manager.secondary_group_history(&iyer).map_err(fmt_err)?,
    });
    serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())
}

fn render_quota(world: &DemoWorld, subject: &str, period: &str) -> Result<String, String> {
    let subject_id = SubjectId::new(subject).map_err(fmt_err)?;
    let period = PeriodMarker::new(period).map_err(fmt_err)?;
    let used = world.store.request_count(&subject_id, &period);

    let payload = json!({
        "subject_id": subject_id.as_str(),
        "period": period.as_str(),
        "requests_submitted": used,
        "per_period_cap": PER_PERIOD_CAP,
        "cap_reached": used >= PER_PERIOD_CAP,
    });
    serde_json::to_string_pretty(&payload).map_err(|e| e.to_string())
}

fn fmt_err(err: impl std::fmt::Debug) -> String {
    format!("{err:?}")
}
