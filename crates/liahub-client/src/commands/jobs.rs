use chrono::Utc;
use serde_json::Value;
use tracing::info;

use liahub_shared::types::ApplicationStatus;

use crate::commands::doc_list;
use crate::state::Client;

/// Search job postings. The result page fully replaces the cached list and
/// selects its first entry; a stale response (an older search resolving
/// late) is dropped by the reducer.
pub async fn search_jobs(client: &Client, query: &str) -> Result<usize, String> {
    let seq = {
        client.lock_store()?.jobs.search_started()
    };

    match client.api().search_jobs(query).await {
        Ok(payload) => {
            let docs = doc_list(&payload, &["jobs", "results"]);
            let mut store = client.lock_store()?;
            store.jobs.apply_search(seq, &docs);
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.jobs.search_failed(seq, message.clone());
            Err(message)
        }
    }
}

/// Create a job posting and merge it at the head of the cached list.
pub async fn create_job_posting(client: &Client, payload: Value) -> Result<String, String> {
    let doc = client
        .api()
        .create_job(&payload)
        .await
        .map_err(|e| e.message())?;

    let mut store = client.lock_store()?;
    store.jobs.apply_created(&doc);
    let id = liahub_shared::ids::canonical_id(&doc).unwrap_or_default();
    info!(job = %id, "Job posting created");
    Ok(id)
}

/// Select a posting in the cached list (detail view).
pub fn select_job(client: &Client, job_id: &str) -> Result<(), String> {
    client.lock_store()?.jobs.select(job_id);
    Ok(())
}

/// Toggle the wishlist flag on a posting.
///
/// The flag and counter flip optimistically before the network settles; a
/// rejection restores the pre-toggle values. A later search is the
/// canonical resync.
pub async fn toggle_wishlist(client: &Client, job_id: &str) -> Result<(), String> {
    {
        client.lock_store()?.jobs.begin_wishlist_toggle(job_id);
    }

    match client.api().toggle_job_wishlist(job_id).await {
        Ok(_) => {
            client.lock_store()?.jobs.confirm_wishlist(job_id);
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.jobs.revert_wishlist(job_id);
            Err(message)
        }
    }
}

/// Apply to a job posting, optimistically marking it applied and bumping
/// its applicant count; a rejection reverts both.
pub async fn apply_to_job(client: &Client, job_id: &str) -> Result<(), String> {
    {
        client.lock_store()?.jobs.begin_apply(job_id);
    }

    match client.api().apply_to_job(job_id).await {
        Ok(doc) => {
            let application = doc.get("application").cloned().unwrap_or(doc);
            client
                .lock_store()?
                .jobs
                .confirm_apply(job_id, Some(&application));
            info!(job = %job_id, "Applied to job");
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.jobs.revert_apply(job_id);
            Err(message)
        }
    }
}

/// Move an application to a new status (recruiter side).
pub async fn update_application_status(
    client: &Client,
    application_id: &str,
    status: ApplicationStatus,
) -> Result<(), String> {
    client
        .api()
        .update_application_status(application_id, status.as_str())
        .await
        .map_err(|e| e.message())?;

    client
        .lock_store()?
        .jobs
        .apply_application_status(application_id, status, Utc::now());
    Ok(())
}

/// Send an offer letter on an application.
pub async fn send_offer(
    client: &Client,
    application_id: &str,
    offer: Value,
) -> Result<(), String> {
    let response = client
        .api()
        .send_job_offer(application_id, &offer)
        .await
        .map_err(|e| e.message())?;

    let letter = response
        .get("offerLetter")
        .or_else(|| offer.get("offerLetter"))
        .and_then(Value::as_str)
        .map(str::to_string);

    client
        .lock_store()?
        .jobs
        .apply_offer_sent(application_id, letter, Utc::now());
    Ok(())
}
