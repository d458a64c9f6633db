//! LIA (internship) posting commands. Same cache contract as the job
//! commands; LIA applications additionally support accept and withdraw.

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use liahub_shared::types::ApplicationStatus;

use crate::commands::doc_list;
use crate::state::Client;

/// Search LIA postings, replacing the cached list with the result page.
pub async fn search_lias(client: &Client, query: &str) -> Result<usize, String> {
    let seq = {
        client.lock_store()?.lias.search_started()
    };

    match client.api().search_lias(query).await {
        Ok(payload) => {
            let docs = doc_list(&payload, &["lias", "results"]);
            let mut store = client.lock_store()?;
            store.lias.apply_search(seq, &docs);
            Ok(docs.len())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.lias.search_failed(seq, message.clone());
            Err(message)
        }
    }
}

/// Create a LIA posting.
pub async fn create_lia_posting(client: &Client, payload: Value) -> Result<String, String> {
    let doc = client
        .api()
        .create_lia(&payload)
        .await
        .map_err(|e| e.message())?;

    let mut store = client.lock_store()?;
    store.lias.apply_created(&doc);
    let id = liahub_shared::ids::canonical_id(&doc).unwrap_or_default();
    info!(lia = %id, "LIA posting created");
    Ok(id)
}

/// Select a posting in the cached list.
pub fn select_lia(client: &Client, lia_id: &str) -> Result<(), String> {
    client.lock_store()?.lias.select(lia_id);
    Ok(())
}

/// Apply to a LIA posting. The posting id was canonicalized at ingestion,
/// so it matches whichever id field the source endpoint used; when nothing
/// in the cache matches, the reducer logs and the UI stays intact.
pub async fn apply_to_lia(client: &Client, lia_id: &str) -> Result<(), String> {
    {
        client.lock_store()?.lias.begin_apply(lia_id);
    }

    match client.api().apply_to_lia(lia_id).await {
        Ok(doc) => {
            let application = doc.get("application").cloned().unwrap_or(doc);
            client
                .lock_store()?
                .lias
                .confirm_apply(lia_id, Some(&application));
            info!(lia = %lia_id, "Applied to LIA");
            Ok(())
        }
        Err(e) => {
            let message = e.message();
            client.lock_store()?.lias.revert_apply(lia_id);
            Err(message)
        }
    }
}

/// Move a LIA application to a new status.
pub async fn update_lia_application_status(
    client: &Client,
    lia_id: &str,
    application_id: &str,
    status: ApplicationStatus,
) -> Result<(), String> {
    client
        .api()
        .update_lia_application_status(lia_id, application_id, status.as_str())
        .await
        .map_err(|e| e.message())?;

    client
        .lock_store()?
        .lias
        .apply_application_status(application_id, status, Utc::now());
    Ok(())
}

/// Send an offer letter on a LIA application.
pub async fn send_lia_offer(
    client: &Client,
    lia_id: &str,
    application_id: &str,
    offer: Value,
) -> Result<(), String> {
    let response = client
        .api()
        .send_lia_offer(lia_id, application_id, &offer)
        .await
        .map_err(|e| e.message())?;

    let letter = response
        .get("offerLetter")
        .or_else(|| offer.get("offerLetter"))
        .and_then(Value::as_str)
        .map(str::to_string);

    client
        .lock_store()?
        .lias
        .apply_offer_sent(application_id, letter, Utc::now());
    Ok(())
}

/// Accept a received offer on a LIA application.
pub async fn accept_lia_offer(
    client: &Client,
    lia_id: &str,
    application_id: &str,
) -> Result<(), String> {
    client
        .api()
        .accept_lia_offer(lia_id, application_id)
        .await
        .map_err(|e| e.message())?;

    client.lock_store()?.lias.apply_application_status(
        application_id,
        ApplicationStatus::OfferAccepted,
        Utc::now(),
    );
    Ok(())
}

/// Withdraw a LIA application.
pub async fn withdraw_lia_application(
    client: &Client,
    lia_id: &str,
    application_id: &str,
) -> Result<(), String> {
    client
        .api()
        .withdraw_lia_application(lia_id, application_id)
        .await
        .map_err(|e| e.message())?;

    client.lock_store()?.lias.apply_application_status(
        application_id,
        ApplicationStatus::Withdrawn,
        Utc::now(),
    );
    Ok(())
}
