//! Dashboard commands: the TTL-gated global fetch, section record CRUD, the
//! two-step move-to-companies with client-side compensation, and assignment
//! resolution.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use liahub_shared::ids::canonical_id;
use liahub_shared::types::SectionKey;

use crate::state::Client;

/// Outcome of a dashboard fetch: either the cache was fresh and nothing
/// happened, or the network was hit and every section was repopulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardFetch {
    CacheHit,
    Fetched,
}

/// Fetch the full dashboard unless the cache is still fresh.
///
/// Inside the TTL window a non-forced call short-circuits before any
/// network traffic and leaves state untouched. One successful fetch
/// populates all sections atomically.
pub async fn fetch_student_dashboard(
    client: &Client,
    force_refresh: bool,
) -> Result<DashboardFetch, String> {
    let seq = {
        let mut store = client.lock_store()?;
        if !force_refresh && store.dashboard.is_cache_fresh(Utc::now()) {
            debug!("Dashboard cache fresh, skipping fetch");
            return Ok(DashboardFetch::CacheHit);
        }
        store.dashboard.fetch_started()
    };

    match client.api().fetch_student_dashboard().await {
        Ok(payload) => {
            let mut store = client.lock_store()?;
            store.dashboard.apply_dashboard(seq, &payload, Utc::now());
            info!("Dashboard fetched");
            Ok(DashboardFetch::Fetched)
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .dashboard
                .fetch_failed(seq, message.clone());
            Err(message)
        }
    }
}

/// Create a record in one section.
pub async fn create_school_record(
    client: &Client,
    section: SectionKey,
    payload: Value,
) -> Result<(), String> {
    {
        client.lock_store()?.dashboard.mutation_started(section);
    }

    match client.api().create_school_record(section, &payload).await {
        Ok(doc) => {
            client.lock_store()?.dashboard.apply_created(section, &doc);
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .dashboard
                .mutation_failed(section, message.clone());
            Err(message)
        }
    }
}

/// Update a record. When the backend reclassifies it into another section,
/// the reducer removes the stale copy from the requested section and files
/// the record where the response says it belongs.
pub async fn update_school_record(
    client: &Client,
    section: SectionKey,
    record_id: &str,
    payload: Value,
) -> Result<(), String> {
    {
        client.lock_store()?.dashboard.mutation_started(section);
    }

    match client
        .api()
        .update_school_record(record_id, section, &payload)
        .await
    {
        Ok(doc) => {
            client.lock_store()?.dashboard.apply_updated(section, &doc);
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .dashboard
                .mutation_failed(section, message.clone());
            Err(message)
        }
    }
}

/// Delete a record. A not-found rejection means the record was already gone
/// server-side, so the local copy is purged exactly as on success instead
/// of leaving a stuck row.
pub async fn delete_school_record(
    client: &Client,
    section: SectionKey,
    record_id: &str,
) -> Result<(), String> {
    {
        client.lock_store()?.dashboard.mutation_started(section);
    }

    match client.api().delete_school_record(record_id).await {
        Ok(_) => {
            client
                .lock_store()?
                .dashboard
                .apply_deleted(section, record_id);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            info!(record = %record_id, "Record already deleted server-side, purging locally");
            client
                .lock_store()?
                .dashboard
                .apply_deleted(section, record_id);
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .dashboard
                .mutation_failed(section, message.clone());
            Err(message)
        }
    }
}

/// Move a record into the companies section: create there, then delete from
/// the source. The backend offers no atomic move, so a failed second step
/// triggers compensation (undo the create); if the undo also fails, the
/// record exists in both sections and the source is parked with a
/// needs-manual-fix error.
pub async fn move_record_to_companies(
    client: &Client,
    source: SectionKey,
    record_id: &str,
) -> Result<(), String> {
    let fields = {
        let store = client.lock_store()?;
        store
            .dashboard
            .section(source)
            .data
            .iter()
            .find(|r| r.id == record_id)
            .map(|r| r.fields.clone())
            .ok_or_else(|| format!("Record {record_id} not found in {source}"))?
    };

    {
        client.lock_store()?.dashboard.mutation_started(source);
    }

    // Step 1: create the copy in the target section.
    let created = match client
        .api()
        .create_school_record(SectionKey::Companies, &fields)
        .await
    {
        Ok(doc) => doc,
        Err(e) => {
            let message = e.message();
            client
                .lock_store()?
                .dashboard
                .mutation_failed(source, message.clone());
            return Err(message);
        }
    };
    let created_id = canonical_id(&created).unwrap_or_else(|| record_id.to_string());
    {
        client
            .lock_store()?
            .dashboard
            .apply_created(SectionKey::Companies, &created);
    }

    // Step 2: delete the original.
    let delete_error = match client.api().delete_school_record(record_id).await {
        Ok(_) => None,
        Err(e) if e.is_not_found() => None,
        Err(e) => Some(e.message()),
    };

    let Some(message) = delete_error else {
        client
            .lock_store()?
            .dashboard
            .apply_deleted(source, record_id);
        info!(record = %record_id, from = %source, "Record moved to companies");
        return Ok(());
    };

    // Compensation: undo the create so the record is not duplicated.
    warn!(record = %record_id, error = %message, "Move delete failed, undoing create");
    match client.api().delete_school_record(&created_id).await {
        Ok(_) => {
            let mut store = client.lock_store()?;
            store
                .dashboard
                .apply_deleted(SectionKey::Companies, &created_id);
            store.dashboard.mutation_failed(source, message.clone());
        }
        Err(undo) if undo.is_not_found() => {
            let mut store = client.lock_store()?;
            store
                .dashboard
                .apply_deleted(SectionKey::Companies, &created_id);
            store.dashboard.mutation_failed(source, message.clone());
        }
        Err(undo) => {
            warn!(record = %created_id, error = %undo.message(), "Undo failed, record duplicated");
            client.lock_store()?.dashboard.set_needs_reconciliation(
                source,
                format!(
                    "Move failed and could not be undone; the record exists in both sections \
                     and needs manual cleanup: {message}"
                ),
            );
        }
    }
    Err(message)
}

/// Confirm a pending student assignment; the record joins the students
/// table.
pub async fn confirm_assignment(client: &Client, assignment_id: &str) -> Result<(), String> {
    client
        .api()
        .confirm_assignment(assignment_id)
        .await
        .map_err(|e| e.message())?;
    client
        .lock_store()?
        .dashboard
        .apply_assignment_resolved(assignment_id, true);
    Ok(())
}

/// Reject a pending student assignment; it leaves the pending list.
pub async fn reject_assignment(client: &Client, assignment_id: &str) -> Result<(), String> {
    client
        .api()
        .reject_assignment(assignment_id)
        .await
        .map_err(|e| e.message())?;
    client
        .lock_store()?
        .dashboard
        .apply_assignment_resolved(assignment_id, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use liahub_api::StaticSession;
    use liahub_shared::types::FetchStatus;

    use crate::state::{Client, ClientConfig};

    /// One scripted response: method, path suffix, status, JSON body.
    type Rule = (&'static str, &'static str, u16, Value);

    /// Minimal scripted HTTP responder. Counts hits per rule index.
    async fn serve(listener: TcpListener, rules: Arc<Vec<Rule>>, hits: Arc<Vec<AtomicUsize>>) {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let rules = rules.clone();
            let hits = hits.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                // Read until the end of headers.
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let header_end = buf
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .unwrap_or(buf.len())
                    + 4;
                let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let request_line = head.lines().next().unwrap_or_default().to_string();

                // Drain the request body so the client finishes writing
                // before we respond and close.
                let content_length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                while buf.len() < header_end + content_length {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let matched = rules.iter().enumerate().find(|(_, (method, path, _, _))| {
                    request_line.starts_with(method) && request_line.contains(path)
                });
                let (status, body) = match matched {
                    Some((index, (_, _, status, body))) => {
                        hits[index].fetch_add(1, Ordering::SeqCst);
                        (*status, body.to_string())
                    }
                    None => (404, json!({"message": "no rule"}).to_string()),
                };

                let reason = if status < 400 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.flush().await;
            });
        }
    }

    async fn scripted_client(rules: Vec<Rule>) -> (Client, Arc<Vec<AtomicUsize>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits: Arc<Vec<AtomicUsize>> =
            Arc::new(rules.iter().map(|_| AtomicUsize::new(0)).collect());
        tokio::spawn(serve(listener, Arc::new(rules), hits.clone()));

        let config = ClientConfig {
            base_url: format!("http://{addr}"),
            socket_url: format!("ws://{addr}"),
        };
        let client = Client::new(config, Arc::new(StaticSession::new("token")));
        (client, hits)
    }

    fn dashboard_payload() -> Value {
        json!({
            "students": [{"_id": "s1"}],
            "teachers": [],
            "educationManagers": [],
            "adminManagement": [],
            "companies": [],
            "leadingCompanies": [],
            "liahubCompanies": [{"_id": "co2", "name": "Beta"}],
            "pendingAssignments": [],
        })
    }

    #[tokio::test]
    async fn a_fresh_cache_short_circuits_without_a_network_call() {
        let (client, hits) = scripted_client(vec![(
            "GET",
            "/api/v1/dashboard/student",
            200,
            dashboard_payload(),
        )])
        .await;

        let first = fetch_student_dashboard(&client, false).await.unwrap();
        assert_eq!(first, DashboardFetch::Fetched);

        let second = fetch_student_dashboard(&client, false).await.unwrap();
        assert_eq!(second, DashboardFetch::CacheHit);

        // Exactly one request reached the network, and state is identical.
        assert_eq!(hits[0].load(Ordering::SeqCst), 1);
        let store = client.lock_store().unwrap();
        let students = store.dashboard.section(SectionKey::Students);
        assert_eq!(students.status, FetchStatus::Succeeded);
        assert_eq!(students.data.len(), 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_the_gate() {
        let (client, hits) = scripted_client(vec![(
            "GET",
            "/api/v1/dashboard/student",
            200,
            dashboard_payload(),
        )])
        .await;

        fetch_student_dashboard(&client, false).await.unwrap();
        let forced = fetch_student_dashboard(&client, true).await.unwrap();

        assert_eq!(forced, DashboardFetch::Fetched);
        assert_eq!(hits[0].load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_move_undoes_the_created_copy() {
        let (client, _hits) = scripted_client(vec![
            ("GET", "/api/v1/dashboard/student", 200, dashboard_payload()),
            (
                "POST",
                "/api/v1/dashboard/school/records",
                201,
                json!({"_id": "co9", "name": "Beta", "section": "companies"}),
            ),
            // The source delete fails; the undo delete succeeds.
            (
                "DELETE",
                "/api/v1/dashboard/school/records/co2",
                500,
                json!({"message": "delete blew up"}),
            ),
            (
                "DELETE",
                "/api/v1/dashboard/school/records/co9",
                200,
                json!({}),
            ),
        ])
        .await;

        fetch_student_dashboard(&client, false).await.unwrap();

        let result =
            move_record_to_companies(&client, SectionKey::LiahubCompanies, "co2").await;
        assert_eq!(result, Err("delete blew up".to_string()));

        let store = client.lock_store().unwrap();
        // The original is still in its source section; the copy is gone.
        assert!(store
            .dashboard
            .section(SectionKey::LiahubCompanies)
            .data
            .iter()
            .any(|r| r.id == "co2"));
        assert!(!store
            .dashboard
            .section(SectionKey::Companies)
            .data
            .iter()
            .any(|r| r.id == "co9"));
        assert_eq!(
            store
                .dashboard
                .section(SectionKey::LiahubCompanies)
                .mutation_error
                .as_deref(),
            Some("delete blew up")
        );
    }

    #[tokio::test]
    async fn failed_undo_parks_the_section_for_manual_cleanup() {
        let (client, _hits) = scripted_client(vec![
            ("GET", "/api/v1/dashboard/student", 200, dashboard_payload()),
            (
                "POST",
                "/api/v1/dashboard/school/records",
                201,
                json!({"_id": "co9", "name": "Beta", "section": "companies"}),
            ),
            // Both the source delete and the undo fail.
            (
                "DELETE",
                "/api/v1/dashboard/school/records/co2",
                500,
                json!({"message": "delete blew up"}),
            ),
            (
                "DELETE",
                "/api/v1/dashboard/school/records/co9",
                500,
                json!({"message": "undo blew up"}),
            ),
        ])
        .await;

        fetch_student_dashboard(&client, false).await.unwrap();

        let result =
            move_record_to_companies(&client, SectionKey::LiahubCompanies, "co2").await;
        assert!(result.is_err());

        let store = client.lock_store().unwrap();
        // Duplicated: the copy is still there, and the section says so.
        assert!(store
            .dashboard
            .section(SectionKey::Companies)
            .data
            .iter()
            .any(|r| r.id == "co9"));
        let error = store
            .dashboard
            .section(SectionKey::LiahubCompanies)
            .mutation_error
            .clone()
            .unwrap();
        assert!(error.contains("manual cleanup"));
    }

    #[tokio::test]
    async fn delete_not_found_still_purges_the_local_row() {
        let (client, _hits) = scripted_client(vec![
            ("GET", "/api/v1/dashboard/student", 200, dashboard_payload()),
            (
                "DELETE",
                "/api/v1/dashboard/school/records/s1",
                404,
                json!({"message": "not found"}),
            ),
        ])
        .await;

        fetch_student_dashboard(&client, false).await.unwrap();

        delete_school_record(&client, SectionKey::Students, "s1")
            .await
            .unwrap();

        let store = client.lock_store().unwrap();
        assert!(store
            .dashboard
            .section(SectionKey::Students)
            .data
            .is_empty());
    }
}
