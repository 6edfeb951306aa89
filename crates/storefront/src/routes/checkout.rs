//! Checkout route handlers.
//!
//! The checkout form posts both answers at once. The core checkout flow
//! asks for them in order through [`FormPrompt`], renders the PDF, and
//! hands it to [`DownloadSink`]. The handler then redraws the widget and
//! fires a `receiptReady` HTMX event pointing at a one-shot download URL.

use axum::{
    Form,
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
};
use kirana_core::{
    Checkout, CheckoutField, CheckoutOutcome, CheckoutPrompt, ReceiptDocument, ReceiptError,
    ReceiptSink,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{CategoryQuery, redraw};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::receipt::PdfReceiptWriter;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

/// Answers checkout prompts from submitted form fields.
#[derive(Debug, Default)]
pub struct FormPrompt {
    name: Option<String>,
    location: Option<String>,
    notices: Vec<String>,
}

impl FormPrompt {
    /// Create a prompt that answers with the given form values.
    #[must_use]
    pub const fn new(name: Option<String>, location: Option<String>) -> Self {
        Self {
            name,
            location,
            notices: Vec::new(),
        }
    }

    /// The most recent notice raised by the flow.
    #[must_use]
    pub fn last_notice(&self) -> Option<&str> {
        self.notices.last().map(String::as_str)
    }
}

impl CheckoutPrompt for FormPrompt {
    fn ask(&mut self, field: CheckoutField) -> Option<String> {
        match field {
            CheckoutField::CustomerName => self.name.take(),
            CheckoutField::DeliveryLocation => self.location.take(),
        }
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// Holds the delivered receipt until the handler stashes it for download.
#[derive(Debug, Default)]
pub struct DownloadSink {
    document: Option<ReceiptDocument>,
}

impl ReceiptSink for DownloadSink {
    fn deliver(&mut self, document: ReceiptDocument) -> std::result::Result<(), ReceiptError> {
        if self.document.is_some() {
            return Err(ReceiptError::Delivery(
                "a receipt was already delivered for this request".to_string(),
            ));
        }
        self.document = Some(document);
        Ok(())
    }
}

/// Run checkout (HTMX).
///
/// Aborted checkouts leave the cart untouched and show why.
#[instrument(skip(state, form))]
pub async fn checkout(
    State(state): State<AppState>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let filter = CategoryQuery {
        category: form.category,
    }
    .filter();
    let currency = state.config().currency;

    let mut prompt = FormPrompt::new(form.name, form.location);
    let mut sink = DownloadSink::default();

    let outcome = state.with_stores(|_, cart| {
        let mut rng = rand::rng();
        Ok(Checkout::new(currency).run(
            cart,
            &mut prompt,
            &PdfReceiptWriter,
            &mut sink,
            &mut rng,
        )?)
    })?;

    match outcome {
        CheckoutOutcome::Aborted(reason) => {
            info!(reason = ?reason, "Checkout aborted");
            let notice = prompt.last_notice().unwrap_or(reason.notice()).to_string();
            Ok(redraw(&state, &filter, notice)?.into_response())
        }
        CheckoutOutcome::Confirmed(receipt) => {
            let document = sink.document.take().ok_or_else(|| {
                AppError::Internal("checkout confirmed without a receipt".to_string())
            })?;
            let filename = document.filename.clone();
            let token = state.stash_receipt(document);
            add_breadcrumb("checkout", "Order confirmed", Some(&[("receipt", filename.as_str())]));
            info!(receipt = %filename, total = %receipt.total, "Receipt ready for download");

            let trigger = serde_json::json!({
                "receiptReady": { "url": format!("/receipts/{token}") }
            })
            .to_string();
            let notice = prompt.last_notice().unwrap_or_default().to_string();

            Ok((
                AppendHeaders([("HX-Trigger", trigger)]),
                redraw(&state, &filter, notice)?,
            )
                .into_response())
        }
    }
}

/// Download a generated receipt. Each receipt can be downloaded once.
#[instrument(skip(state))]
pub async fn receipt(State(state): State<AppState>, Path(token): Path<Uuid>) -> Result<Response> {
    let Some(document) = state.take_receipt(token) else {
        warn!(%token, "Unknown or already downloaded receipt");
        return Err(AppError::NotFound("receipt".to_string()));
    };

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_filename(&document.filename),
        urlencoding::encode(&document.filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// Fallback filename for clients that ignore `filename*`.
fn ascii_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect()
}
