use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use peer_rate::error::AppError;
use peer_rate::reviews::{
    Agency, AgencyId, Criterion, CriterionId, CycleDraft, CycleId, EvaluationSubmission,
    ReviewService, Role, Scope, User, UserId,
};
use peer_rate::roster::RosterImporter;

use crate::infra::{InMemoryCycles, InMemoryDirectory, InMemoryEvaluations};

type DemoService = ReviewService<InMemoryDirectory, InMemoryCycles, InMemoryEvaluations>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed the directory from a roster CSV export instead of the built-in sample
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Cycle start date (YYYY-MM-DD). Defaults to a week ago.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Cycle end date (YYYY-MM-DD). Defaults to a week from now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct RosterCheckArgs {
    /// Path to the roster CSV export
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_roster_check(args: RosterCheckArgs) -> Result<(), AppError> {
    let service = build_service();
    let summary = RosterImporter::from_path(&args.path, &service)?;

    println!(
        "Roster export is valid: {} agencies, {} users",
        summary.agencies, summary.users
    );
    match service.agencies() {
        Ok(agencies) => {
            for agency in agencies {
                println!("- {} ({} members)", agency.name, agency.employee_count);
            }
        }
        Err(err) => println!("  Agency listing unavailable: {}", err),
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { roster, start, end } = args;

    let today = Local::now().date_naive();
    let start = start.unwrap_or(today - Duration::days(7));
    let end = end.unwrap_or(today + Duration::days(7));

    println!("Peer evaluation demo");
    let service = build_service();

    match roster {
        Some(path) => {
            let summary = RosterImporter::from_path(path, &service)?;
            println!(
                "Seeded directory from roster export: {} agencies, {} users",
                summary.agencies, summary.users
            );
        }
        None => {
            seed_sample_directory(&service)?;
            println!("Seeded directory with the built-in sample agencies");
        }
    }

    let cycle = match service.create_cycle(CycleDraft {
        name: "Demo Peer Review".to_string(),
        start_date: start,
        end_date: end,
        scope: Scope::AllAgencies,
        criteria: None,
        bands: None,
    }) {
        Ok(cycle) => cycle,
        Err(err) => {
            println!("  Could not create the demo cycle: {}", err);
            return Ok(());
        }
    };
    println!(
        "Cycle '{}': {} -> {} ({} criteria, {} rating bands)",
        cycle.name,
        cycle.start_date,
        cycle.end_date,
        cycle.criteria.len(),
        cycle.bands.len()
    );

    let agency = match pick_demo_agency(&service) {
        Some(agency) => agency,
        None => {
            println!("  No agency with at least two eligible reviewers; nothing to demo");
            return Ok(());
        }
    };
    println!("Demo agency: {}", agency.name);

    submit_demo_evaluations(&service, &cycle.id, &cycle.criteria, &agency.id);

    println!("\nCompletion (worst progress first)");
    match service.completion(&cycle.id, &agency.id) {
        Ok(rows) => {
            for row in &rows {
                let missing: Vec<&str> = row
                    .missing_peers
                    .iter()
                    .map(|peer| peer.name.as_str())
                    .collect();
                let note = if missing.is_empty() {
                    "complete".to_string()
                } else {
                    format!("missing {}", missing.join(", "))
                };
                println!(
                    "- {}: {}/{} ({}%) {}",
                    row.evaluator.name, row.done, row.required, row.percent, note
                );
            }
        }
        Err(err) => println!("  Completion unavailable: {}", err),
    }

    println!("\nAgency board");
    match service.board(&cycle.id, &agency.id) {
        Ok(board) => {
            for (rank, row) in board.rows.iter().enumerate() {
                match row.overall_average {
                    Some(average) => println!(
                        "{:>2}. {} | {:.1} | {} ({} reviews)",
                        rank + 1,
                        row.name,
                        average,
                        row.rating_label,
                        row.sample_size
                    ),
                    None => println!("{:>2}. {} | not yet rated", rank + 1, row.name),
                }
            }
            println!("Rating distribution:");
            for entry in &board.distribution {
                println!("  - {}: {}", entry.label, entry.count);
            }
        }
        Err(err) => println!("  Board unavailable: {}", err),
    }

    println!("\nLeader digest");
    match service.digest(&cycle.id, &agency.id) {
        Ok(digest) => {
            println!(
                "- {}/{} staff reviewed ({}% coverage)",
                digest.reviewed_count, digest.staff_count, digest.coverage_percent
            );
            if let Some(average) = digest.average_score {
                println!("- Agency average score: {:.1}", average);
            }
            for entry in &digest.criterion_pulse {
                println!("  - {}: {:.1}", entry.name, entry.average);
            }
            for line in &digest.attention {
                println!("- {}", line);
            }
        }
        Err(err) => println!("  Digest unavailable: {}", err),
    }

    Ok(())
}

fn build_service() -> DemoService {
    ReviewService::new(
        Arc::new(InMemoryDirectory::default()),
        Arc::new(InMemoryCycles::default()),
        Arc::new(InMemoryEvaluations::default()),
    )
}

fn seed_sample_directory(service: &DemoService) -> Result<(), AppError> {
    let planning = AgencyId("district-planning-office".to_string());
    let finance = AgencyId("finance-department".to_string());

    for (id, name, region) in [
        (&planning, "District Planning Office", Some("Northern")),
        (&finance, "Finance Department", None),
    ] {
        if let Err(err) = service.add_agency(Agency {
            id: id.clone(),
            name: name.to_string(),
            employee_count: 0,
            region: region.map(str::to_string),
        }) {
            println!("  Skipped agency {}: {}", name, err);
        }
    }

    let members = [
        ("an", "Tran Van An", Role::Employee, &planning),
        ("bao", "Le Quoc Bao", Role::Employee, &planning),
        ("chi", "Nguyen Minh Chi", Role::Employee, &planning),
        ("lan", "Pham Thi Lan", Role::Leader, &planning),
        ("quan", "Hoang Van Quan", Role::Admin, &planning),
        ("dung", "Vu Tien Dung", Role::Employee, &finance),
        ("hoa", "Dang Thi Hoa", Role::Employee, &finance),
    ];
    for (id, name, role, agency) in members {
        if let Err(err) = service.add_user(User {
            id: UserId(id.to_string()),
            name: name.to_string(),
            email: format!("{id}@phutho.gov.vn"),
            avatar: None,
            role,
            agency_id: agency.clone(),
            department: Some("Operations".to_string()),
            position: None,
        }) {
            println!("  Skipped user {}: {}", name, err);
        }
    }

    Ok(())
}

/// First agency with enough eligible reviewers to make a board worth showing.
fn pick_demo_agency(service: &DemoService) -> Option<Agency> {
    let agencies = service.agencies().ok()?;
    agencies
        .into_iter()
        .find(|agency| agency.employee_count >= 2)
}

/// Rates most of the agency's peer pairs with varied deterministic scores,
/// leaving the final pair open so the completion view has a straggler.
fn submit_demo_evaluations(
    service: &DemoService,
    cycle: &CycleId,
    criteria: &[Criterion],
    agency: &AgencyId,
) {
    let rows = match service.completion(cycle, agency) {
        Ok(rows) => rows,
        Err(err) => {
            println!("  Completion lookup failed: {}", err);
            return;
        }
    };

    let mut submitted = 0usize;
    let total_pairs: usize = rows.iter().map(|row| row.required).sum();
    for (i, row) in rows.iter().enumerate() {
        for (j, peer) in row.missing_peers.iter().enumerate() {
            if submitted + 1 == total_pairs {
                continue;
            }
            let base = 68 + ((i * 7 + j * 11) % 29) as u32;
            let scores: BTreeMap<CriterionId, f64> = criteria
                .iter()
                .enumerate()
                .map(|(k, criterion)| {
                    let value = (base + ((k * 5) % 13) as u32).min(100);
                    (criterion.id.clone(), f64::from(value))
                })
                .collect();
            match service.submit_evaluation(
                cycle,
                EvaluationSubmission {
                    evaluator_id: row.evaluator.id.clone(),
                    evaluatee_id: peer.id.clone(),
                    scores,
                },
            ) {
                Ok(_) => submitted += 1,
                Err(err) => println!(
                    "  Skipped {} -> {}: {}",
                    row.evaluator.name, peer.name, err
                ),
            }
        }
    }
    println!("Submitted {} of {} peer reviews", submitted, total_pairs);
}
