//! End-to-end tests for the HTTP shell.
//!
//! Runs the real router in-process with a fixed clock (2025-01-01) and a
//! catalog built from the shared fixtures.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use axum_test::TestServer;
use dance_registry_core::catalog::{CatalogDocument, EventRules, InMemoryCatalog};
use dance_registry_core::types::{
    Academy, EventId, Money, Participant, PullCoupleCriterion, Ticket, TicketStatus, UserId,
};
use dance_registry_testing::fixtures::{self, ParticipantBuilder};
use dance_registry_testing::test_clock;
use dance_registry_web::handlers::categories::ResolveCategoryResponse;
use dance_registry_web::handlers::tickets::TicketResponse;
use dance_registry_web::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;

struct Harness {
    server: TestServer,
    event_id: EventId,
    academy: Academy,
}

fn harness() -> Harness {
    dance_registry_testing::init_test_tracing();
    let event_id = EventId::new();
    let document = CatalogDocument {
        categories: fixtures::standard_ladder(),
        events: vec![EventRules {
            event_id,
            policy: fixtures::pull_couple(PullCoupleCriterion::Category, 1),
            modalities: vec![
                fixtures::solo_modality("Solista", 2_500, &["Infantil", "Juvenil", "Adulto"]),
                fixtures::couple_modality("Pareja", 4_000),
            ],
        }],
    };
    let catalog = InMemoryCatalog::from_document(document).unwrap();
    let state = AppState::new(catalog).with_clock(Arc::new(test_clock()));

    Harness {
        server: TestServer::new(build_router(state)).unwrap(),
        event_id,
        academy: fixtures::academy("Salsa Norte"),
    }
}

impl Harness {
    fn dancer(&self, first_name: &str, age: u32) -> ParticipantBuilder {
        ParticipantBuilder::new(first_name, "Rojas")
            .aged(age)
            .academy(&self.academy)
    }

    fn draft(&self) -> Value {
        json!({
            "event_id": self.event_id,
            "academy_id": self.academy.id,
            "created_by": UserId::new(),
        })
    }

    async fn open_with_solo(&self, dancer: &Participant) -> TicketResponse {
        self.server
            .post("/api/v1/tickets/entries")
            .json(&json!({
                "draft": self.draft(),
                "modality": "Solista",
                "primary": dancer,
            }))
            .await
            .json::<TicketResponse>()
    }
}

// ═══════════════════════════════════════════════════════════
// Health
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn health_and_readiness() {
    let h = harness();

    let health = h.server.get("/health").await;
    health.assert_status_ok();
    health.assert_text("ok");

    let ready = h.server.get("/ready").await.json::<Value>();
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["categories"], 7);
    assert_eq!(ready["events"], 1);
}

// ═══════════════════════════════════════════════════════════
// Rule queries
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn resolve_category_defaults_to_clock_date() {
    let h = harness();

    let response = h
        .server
        .post("/api/v1/categories/resolve")
        .json(&json!({ "birth_date": "2010-06-15" }))
        .await;
    response.assert_status_ok();

    let body = response.json::<ResolveCategoryResponse>();
    assert_eq!(body.age, Some(14));
    assert_eq!(body.category.name(), Some("Infantil"));
    assert_eq!(body.as_of, fixtures::competition_day());
}

#[tokio::test]
async fn pull_couple_reports_difference_when_refused() {
    let h = harness();

    let body = h
        .server
        .post("/api/v1/pull-couple/evaluate")
        .json(&json!({
            "event_id": h.event_id,
            "a": { "category": "Infantil", "age": 13 },
            "b": { "category": "Adulto", "age": 20 },
        }))
        .await
        .json::<Value>();

    assert_eq!(body["allowed"], false);
    assert_eq!(body["difference"], 2);
    assert_eq!(body["final_category"], "Adulto");
}

#[tokio::test]
async fn pull_couple_unknown_event_is_not_found() {
    let h = harness();

    let response = h
        .server
        .post("/api/v1/pull-couple/evaluate")
        .json(&json!({
            "event_id": EventId::new(),
            "a": { "category": "Infantil", "age": 13 },
            "b": { "category": "Juvenil", "age": 15 },
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn pull_couple_unknown_category_is_unprocessable() {
    let h = harness();

    let response = h
        .server
        .post("/api/v1/pull-couple/evaluate")
        .json(&json!({
            "event_id": h.event_id,
            "a": { "category": "Veterano", "age": 60 },
            "b": { "category": "Juvenil", "age": 15 },
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "UNKNOWN_CATEGORY");
}

#[tokio::test]
async fn eligibility_rejection_is_a_verdict_not_an_error() {
    let h = harness();
    let dancer = h.dancer("Lucia", 16).female().build();

    let response = h
        .server
        .post("/api/v1/eligibility/validate")
        .json(&json!({
            "event_id": h.event_id,
            "modality": "Pareja",
            "inscriber_academy_id": h.academy.id,
            "primary": dancer,
        }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["verdict"], "rejected");
    assert_eq!(body["reason"]["code"], "PARTNER_REQUIRED");
}

#[tokio::test]
async fn eligibility_unknown_modality_is_not_found() {
    let h = harness();
    let dancer = h.dancer("Lucia", 16).build();

    h.server
        .post("/api/v1/eligibility/validate")
        .json(&json!({
            "event_id": h.event_id,
            "modality": "Tango",
            "inscriber_academy_id": h.academy.id,
            "primary": dancer,
        }))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════
// Ticket lifecycle
// ═══════════════════════════════════════════════════════════

#[tokio::test]
async fn full_ticket_lifecycle() {
    let h = harness();
    let solo = h.dancer("Lucia", 16).female().build();
    let leader = h.dancer("Mateo", 17).male().build();
    let follower = h.dancer("Sofia", 15).female().build();

    // First entry opens the draft
    let opened = h.open_with_solo(&solo).await;
    assert_eq!(opened.ticket.status, TicketStatus::Draft);
    assert_eq!(opened.ticket.total_amount.cents(), 2_500);
    assert_eq!(opened.events.len(), 2);

    // Second entry continues it
    let added = h
        .server
        .post("/api/v1/tickets/entries")
        .json(&json!({
            "ticket": opened.ticket,
            "modality": "Pareja",
            "primary": leader,
            "partner": follower,
        }))
        .await
        .json::<TicketResponse>();
    assert_eq!(added.ticket.entries.len(), 2);
    assert_eq!(added.ticket.total_amount.cents(), 6_500);
    assert_eq!(added.ticket.entries[1].category, "Juvenil");

    let submitted = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": added.ticket }))
        .await
        .json::<TicketResponse>();
    assert_eq!(submitted.ticket.status, TicketStatus::Pending);
    assert_eq!(submitted.ticket.submitted_at, Some(test_clock_now()));

    let confirmed = h
        .server
        .post("/api/v1/tickets/confirm")
        .json(&json!({ "ticket": submitted.ticket }))
        .await
        .json::<TicketResponse>();
    assert_eq!(confirmed.ticket.status, TicketStatus::Confirmed);

    // Confirmed is terminal
    let response = h
        .server
        .post("/api/v1/tickets/cancel")
        .json(&json!({ "ticket": confirmed.ticket, "reason": "changed plans" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "ILLEGAL_TRANSITION");
}

#[tokio::test]
async fn second_draft_for_same_event_conflicts() {
    let h = harness();
    let first = h.open_with_solo(&h.dancer("Lucia", 16).build()).await;

    let mut draft = h.draft();
    draft["existing"] = json!([first.ticket]);

    let response = h
        .server
        .post("/api/v1/tickets/entries")
        .json(&json!({
            "draft": draft,
            "modality": "Solista",
            "primary": h.dancer("Ana", 20).build(),
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "DRAFT_ALREADY_OPEN");
}

#[tokio::test]
async fn ineligible_entry_is_rejected_with_reason_code() {
    let h = harness();
    let toddler = h.dancer("Pablo", 4).male().build();

    let response = h
        .server
        .post("/api/v1/tickets/entries")
        .json(&json!({
            "draft": h.draft(),
            "modality": "Solista",
            "primary": toddler,
        }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "CATEGORY_NOT_ALLOWED");
}

#[tokio::test]
async fn remove_out_of_range_is_bad_request() {
    let h = harness();
    let opened = h.open_with_solo(&h.dancer("Lucia", 16).build()).await;

    let response = h
        .server
        .post("/api/v1/tickets/entries/remove")
        .json(&json!({ "ticket": opened.ticket, "index": 5 }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INDEX_OUT_OF_RANGE");
}

#[tokio::test]
async fn remove_then_submit_empty_ticket_fails() {
    let h = harness();
    let opened = h.open_with_solo(&h.dancer("Lucia", 16).build()).await;

    let emptied = h
        .server
        .post("/api/v1/tickets/entries/remove")
        .json(&json!({ "ticket": opened.ticket, "index": 0 }))
        .await
        .json::<TicketResponse>();
    assert!(emptied.ticket.entries.is_empty());
    assert!(emptied.ticket.total_amount.is_zero());

    let response = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": emptied.ticket }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "EMPTY_TICKET");
}

#[tokio::test]
async fn submit_rechecks_affiliation_against_roster() {
    let h = harness();
    let dancer = h.dancer("Lucia", 16).build();
    let opened = h.open_with_solo(&dancer).await;

    // The dancer changed academies after the entry was added
    let mut transferred = dancer.clone();
    transferred.academy = Some(fixtures::academy("Ritmo Sur"));

    let response = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": opened.ticket, "roster": [transferred] }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "GROUP_VALIDATION");

    // Without a roster the snapshot taken at validation time is used
    let submitted = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": opened.ticket }))
        .await
        .json::<TicketResponse>();
    assert_eq!(submitted.ticket.status, TicketStatus::Pending);
}

#[tokio::test]
async fn snapshot_with_wrong_total_is_refused() {
    let h = harness();
    let opened = h.open_with_solo(&h.dancer("Lucia", 16).build()).await;

    let mut tampered = opened.ticket.clone();
    tampered.total_amount = Money::from_cents(1);
    let response = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": tampered }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "TOTAL_MISMATCH");
    assert_eq!(body["details"]["recorded"], 1);
    assert_eq!(body["details"]["computed"], 2_500);

    // A pending ticket cannot be confirmed with a rewritten total either
    let mut pending = h
        .server
        .post("/api/v1/tickets/submit")
        .json(&json!({ "ticket": opened.ticket }))
        .await
        .json::<TicketResponse>()
        .ticket;
    pending.total_amount = Money::from_cents(1);
    let response = h
        .server
        .post("/api/v1/tickets/confirm")
        .json(&json!({ "ticket": pending }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "TOTAL_MISMATCH");
}

#[tokio::test]
async fn add_without_ticket_or_draft_is_bad_request() {
    let h = harness();

    h.server
        .post("/api/v1/tickets/entries")
        .json(&json!({
            "modality": "Solista",
            "primary": h.dancer("Lucia", 16).build(),
        }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelled_draft_cannot_take_entries() {
    let h = harness();
    let opened = h.open_with_solo(&h.dancer("Lucia", 16).build()).await;

    let cancelled: Ticket = h
        .server
        .post("/api/v1/tickets/cancel")
        .json(&json!({ "ticket": opened.ticket }))
        .await
        .json::<TicketResponse>()
        .ticket;
    assert_eq!(cancelled.status, TicketStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let response = h
        .server
        .post("/api/v1/tickets/entries")
        .json(&json!({
            "ticket": cancelled,
            "modality": "Solista",
            "primary": h.dancer("Ana", 20).build(),
        }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "INVALID_STATE");
}

fn test_clock_now() -> chrono::DateTime<chrono::Utc> {
    use dance_registry_core::environment::Clock;
    test_clock().now()
}
