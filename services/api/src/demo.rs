use crate::infra::{in_memory_backend, ApiServices, OfflineFunctions};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use landlord_hub::backend::{
    collections, Backend, DocumentStore, InMemoryDocumentStore, InMemoryObjectStorage, Query,
};
use landlord_hub::clock::{Clock, FixedClock};
use landlord_hub::config::{AppConfig, AppEnvironment, FallbackMode, InviteConfig, ServerConfig, TelemetryConfig};
use landlord_hub::error::AppError;
use landlord_hub::workflows::contractors::{assess_contractor, Contractor, RelationshipService};
use landlord_hub::workflows::dashboard::{DashboardSummary, MaintenanceFeed};
use landlord_hub::workflows::invites::{InviteIssuer, InviteRequest, InviteService};
use landlord_hub::workflows::maintenance::{
    is_overdue, AttachmentService, BulkOperation, MaintenanceImporter, OverduePolicy,
    RequestFilter, RequestStatistics,
};
use landlord_hub::workflows::onboarding::assess_document;
use landlord_hub::workflows::validation::ValidationErrors;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_LANDLORD_ID: &str = "landlord-demo";
const DEMO_TENANT_ID: &str = "tenant-demo";
const DEMO_CONTRACTOR_ID: &str = "contractor-demo";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pin "now" (RFC 3339 or YYYY-MM-DD). Defaults to the current time.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Skip the invite issuance and redemption portion of the demo.
    #[arg(long)]
    pub(crate) skip_invites: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MaintenanceStatsArgs {
    /// CSV export of maintenance tickets
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to the current time.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Only list tickets that are overdue
    #[arg(long)]
    pub(crate) overdue_only: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PropertyScoreArgs {
    /// Property document as JSON
    #[arg(long)]
    pub(crate) json: PathBuf,
}

pub(crate) fn run_maintenance_stats(args: MaintenanceStatsArgs) -> Result<(), AppError> {
    let MaintenanceStatsArgs {
        csv,
        now,
        overdue_only,
    } = args;

    let now = now.unwrap_or_else(Utc::now);
    let policy = AppConfig::load()
        .map(|config| config.overdue)
        .unwrap_or_default();
    let requests = MaintenanceImporter::from_path(&csv)?;
    let filter = RequestFilter {
        overdue_only,
        ..RequestFilter::default()
    };
    let listed = filter.apply(&requests, now, &policy);
    let statistics = RequestStatistics::compute(&requests, now, &policy);

    println!("Maintenance statistics for {}", csv.display());
    render_statistics(&statistics);
    println!(
        "\n{} ticket(s){}:",
        listed.len(),
        if overdue_only { " overdue" } else { "" }
    );
    for request in listed {
        println!(
            "  - {} [{}] {}{}",
            request.id,
            request.status.label(),
            if request.title.is_empty() {
                "(untitled)"
            } else {
                request.title.as_str()
            },
            if is_overdue(request, now, &policy) {
                " (overdue)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

pub(crate) fn run_property_score(args: PropertyScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.json)?;
    let document: Value = serde_json::from_str(&raw)?;
    if !document.is_object() {
        return Err(ValidationErrors::single("property", "must be a JSON object").into());
    }

    let completeness = assess_document(&document);
    println!(
        "Overall completeness: {}% ({})",
        completeness.overall_score, completeness.status_label
    );
    for entry in &completeness.categories {
        println!(
            "  - {}: {}% ({}){}",
            entry.category_label,
            entry.result.score,
            entry.status_label,
            if entry.result.missing_fields.is_empty() {
                String::new()
            } else {
                format!(" missing: {}", entry.result.missing_fields.join(", "))
            }
        );
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { now, skip_invites } = args;
    let now = now.unwrap_or_else(Utc::now);
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
    let config = demo_config();

    let store = InMemoryDocumentStore::new();
    seed_demo_data(&store, now)?;
    let backend = in_memory_backend(&store, clock.clone());
    let services = ApiServices::new(&config, backend.clone(), clock.clone());

    println!("Landlord dashboard demo ({})", now.to_rfc3339());

    println!("\nProperty completeness");
    for document in store.query(collections::PROPERTIES, &Query::new())? {
        let completeness = assess_document(&document.data);
        println!(
            "  - {}: {}% ({}), {} field(s) missing",
            document.id,
            completeness.overall_score,
            completeness.status_label,
            completeness.missing_field_count()
        );
    }

    let updates = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let feed_updates = updates.clone();
    let subscription = MaintenanceFeed::watch(
        &store,
        DEMO_LANDLORD_ID,
        config.overdue,
        clock.clone(),
        move |update| {
            feed_updates.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            println!(
                "  [feed] {} ticket(s), {} open, {} overdue",
                update.statistics.total,
                update.statistics.open(),
                update.statistics.overdue
            );
        },
    )?;

    let summary = services.dashboard.summary(DEMO_LANDLORD_ID)?;
    render_summary(&summary);

    println!("\nRepair triage");
    for description in [
        "Kitchen breaker keeps tripping when the microwave runs",
        "Water is flooding the basement from a burst pipe",
        "Odd noise somewhere upstairs",
    ] {
        let decision = services.triage.triage(description, &[])?;
        println!("  - \"{description}\"\n    -> {}", decision.message());
    }

    let attachments = AttachmentService::new(backend.documents(), backend.storage(), clock.clone());
    let attachment = attachments.attach_photo("req-101", DEMO_PNG, "image/png")?;
    println!("\nAttached photo to req-101 -> {}", attachment.url);

    let relationships = RelationshipService::new(backend.documents());
    relationships.link_contractor(DEMO_LANDLORD_ID, DEMO_CONTRACTOR_ID)?;
    let rating = relationships.record_rating(DEMO_CONTRACTOR_ID, 5)?;
    if let Some(document) = store.get(collections::CONTRACTORS, DEMO_CONTRACTOR_ID)? {
        let contractor: Contractor = document.parse()?;
        let profile = assess_contractor(&contractor);
        println!(
            "Linked contractor {} (profile {}%, rating {:.1} from {} review(s))",
            contractor.display_name(),
            profile.score,
            rating.average,
            rating.review_count
        );
    }

    println!("\nBulk close of completed repairs");
    let outcome = services.bulk.dispatch(
        &["req-102".to_string(), "req-103".to_string()],
        &BulkOperation::Close,
    )?;
    println!(
        "  {} of {} request(s) updated via {}",
        outcome.updated, outcome.requested, outcome.operation
    );
    subscription.unsubscribe();
    println!(
        "  feed delivered {} update(s)",
        updates.load(std::sync::atomic::Ordering::Relaxed)
    );

    if skip_invites {
        return Ok(());
    }

    println!("\nTenant invites");
    let issued = services.invites.issue(&InviteRequest::new("prop-maple"))?;
    println!(
        "  {} ({}) expires {} -> {}",
        issued.invite.code,
        issued.origin_label,
        issued.invite.expires_at.to_rfc3339(),
        issued.join_url
    );
    let redeemed = services.invites.redeem(&issued.invite.code, DEMO_TENANT_ID)?;
    println!(
        "  redeemed by {} for {}",
        redeemed.consumed_by.as_deref().unwrap_or(DEMO_TENANT_ID),
        redeemed.property_id
    );

    let offline_backend = Backend::new(
        Arc::new(store.clone()),
        Arc::new(OfflineFunctions),
        Arc::new(InMemoryObjectStorage::default()),
    );
    let degraded = InviteService::new(
        InviteIssuer::from_config(FallbackMode::Demo, &offline_backend),
        offline_backend,
        clock,
        config.invites.join_base_url.clone(),
    );
    let fallback = degraded.issue(&InviteRequest::new("prop-birch"))?;
    println!(
        "  functions offline -> {} ({})",
        fallback.invite.code, fallback.origin_label
    );

    Ok(())
}

fn render_statistics(statistics: &RequestStatistics) {
    println!(
        "  total {} | pending {} | in progress {} | completed {} | overdue {}",
        statistics.total,
        statistics.pending,
        statistics.in_progress,
        statistics.completed,
        statistics.overdue
    );
    println!(
        "  completion {:.0}% | total cost ${:.2}",
        statistics.completion_rate() * 100.0,
        statistics.total_cost
    );
}

fn render_summary(summary: &DashboardSummary) {
    println!("\nDashboard summary");
    render_statistics(&summary.statistics);
    println!(
        "  portfolio readiness {}% ({})",
        summary.average_property_score,
        summary.average_property_status.label()
    );
    for property in &summary.properties {
        println!(
            "  - {} {}% ({}) | {} open request(s)",
            property.name, property.overall_score, property.status_label, property.open_requests
        );
    }
    println!("  Requests:");
    for card in &summary.requests {
        println!(
            "    - {} {} [{} / {}] {} ({}){}",
            card.id,
            card.title,
            card.bucket_label,
            card.priority_label,
            card.created_label,
            card.age_label,
            if card.overdue { " OVERDUE" } else { "" }
        );
    }
}

fn demo_config() -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Development,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
        },
        invites: InviteConfig {
            fallback: FallbackMode::Demo,
            ..InviteConfig::default()
        },
        overdue: OverduePolicy::default(),
    }
}

/// Smallest valid PNG header; enough for the upload checks.
const DEMO_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Populate a store with one landlord's portfolio.
pub(crate) fn seed_demo_data(
    store: &InMemoryDocumentStore,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let ago = |hours: i64| (now - Duration::hours(hours)).to_rfc3339();

    store.set(
        collections::USERS,
        DEMO_LANDLORD_ID,
        json!({ "role": "landlord", "name": "Dana Whitfield" }),
    )?;
    store.set(
        collections::USERS,
        DEMO_TENANT_ID,
        json!({ "role": "tenant", "name": "Sam Ortiz" }),
    )?;
    store.set(
        collections::CONTRACTORS,
        DEMO_CONTRACTOR_ID,
        json!({
            "name": "Rosa Delgado",
            "company": "Delgado Plumbing & Heating",
            "email": "rosa@delgado.example",
            "phone": "555-0142",
            "trades": ["plumbing", "hvac"],
            "serviceArea": "Ames, IA"
        }),
    )?;

    store.set(
        collections::PROPERTIES,
        "prop-maple",
        json!({
            "ownerId": DEMO_LANDLORD_ID,
            "name": "Maple Court",
            "address": { "street": "12 Maple St", "city": "Ames", "state": "IA", "zip": "50010" },
            "propertyType": "duplex",
            "squareFootage": 2100,
            "yearBuilt": 1978,
            "units": 2,
            "bedrooms": 4,
            "bathrooms": 2,
            "purchasePrice": 285000,
            "monthlyRent": 1850,
            "propertyTax": 3900,
            "insuranceCost": 1200,
            "mortgagePayment": 1325,
            "hvacData": {
                "currentSystems": ["gas furnace", "central air"],
                "systemAge": 9,
                "fuelType": "natural gas",
                "filterSize": "16x25x1",
                "thermostatType": "smart"
            },
            "plumbingData": {
                "waterHeaterType": "tank",
                "waterHeaterAge": 6,
                "pipeMaterial": "copper"
            }
        }),
    )?;
    store.set(
        collections::PROPERTIES,
        "prop-birch",
        json!({
            "ownerId": DEMO_LANDLORD_ID,
            "address": { "street": "48 Birch Ave", "city": "Ames" },
            "monthlyRent": 1400
        }),
    )?;

    let requests = [
        ("req-101", "prop-maple", "Breaker trips in kitchen", "pending", "high", 30, None),
        ("req-102", "prop-maple", "Leaky bathroom faucet", "in-progress", "low", 200, Some(95.0)),
        ("req-103", "prop-birch", "Replace furnace filter", "assigned", "medium", 12, Some(40.0)),
        ("req-104", "prop-birch", "Gutter cleaning", "completed", "low", 400, Some(150.0)),
    ];
    for (id, property_id, title, status, priority, age_hours, cost) in requests {
        let mut document = json!({
            "landlordId": DEMO_LANDLORD_ID,
            "propertyId": property_id,
            "title": title,
            "status": status,
            "priority": priority,
            "createdAt": ago(age_hours),
        });
        if let (Some(cost), Some(fields)) = (cost, document.as_object_mut()) {
            fields.insert("estimatedCost".to_string(), json!(cost));
        }
        store.set(collections::MAINTENANCE_REQUESTS, id, document)?;
    }

    Ok(())
}
