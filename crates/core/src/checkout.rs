//! Checkout flow.
//!
//! ```text
//! Idle ──(empty cart)──────────────────────────────► Aborted
//!  │
//!  ▼
//! CollectingInput ──(name or location missing)─────► Aborted
//!  │
//!  ▼
//! Generating ──(document built + delivered)────────► Confirmed
//! ```
//!
//! The flow talks to its surroundings through three ports: a
//! [`CheckoutPrompt`] that asks the customer for input and shows notices, a
//! [`ReceiptWriter`] that turns a [`Receipt`] into document bytes, and a
//! [`ReceiptSink`] that hands the document to the customer. The cart is only
//! cleared after the document was delivered.

use std::ops::RangeInclusive;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::cart::{CartError, CartStore};
use crate::storage::KeyValueStore;
use crate::types::{CurrencyCode, Price};

/// Estimated delivery time range, in minutes.
pub const DELIVERY_MINUTES: RangeInclusive<u32> = 30..=60;

/// Notice shown when checkout is attempted with an empty cart.
pub const EMPTY_CART_NOTICE: &str = "Your cart is empty!";

/// Notice shown once the receipt has been handed over.
pub const CONFIRMATION_NOTICE: &str =
    "Thank you for your purchase! Your receipt has been downloaded.";

/// Errors raised while producing or delivering a receipt document.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The document could not be built.
    #[error("failed to build receipt document: {0}")]
    Document(String),

    /// The finished document could not be handed to the customer.
    #[error("failed to deliver receipt: {0}")]
    Delivery(String),
}

/// Errors that stop checkout after input was collected.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    CollectingInput,
    Generating,
    Confirmed,
    Aborted(AbortReason),
}

/// Why a checkout stopped without an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    EmptyCart,
    MissingName,
    MissingLocation,
}

impl AbortReason {
    /// Message suitable for showing to the customer.
    #[must_use]
    pub const fn notice(&self) -> &'static str {
        match self {
            Self::EmptyCart => EMPTY_CART_NOTICE,
            Self::MissingName => "Checkout cancelled: please enter your name.",
            Self::MissingLocation => "Checkout cancelled: please enter a delivery location.",
        }
    }
}

/// A value the customer is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutField {
    CustomerName,
    DeliveryLocation,
}

impl CheckoutField {
    /// Prompt text.
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        match self {
            Self::CustomerName => "Enter your name:",
            Self::DeliveryLocation => "Enter delivery location:",
        }
    }

    /// Suggested value pre-filled in the prompt.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::CustomerName => "John Doe",
            Self::DeliveryLocation => "CBN Colony, Nizamabad",
        }
    }
}

/// Customer-facing side of checkout.
pub trait CheckoutPrompt {
    /// Ask for one field. `None` means the customer cancelled.
    fn ask(&mut self, field: CheckoutField) -> Option<String>;

    /// Show a notice to the customer.
    fn notify(&mut self, message: &str);
}

/// Turns a receipt into a document.
pub trait ReceiptWriter {
    /// Render `receipt` into document bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Document`] if the document cannot be built.
    fn write(&self, receipt: &Receipt) -> Result<Vec<u8>, ReceiptError>;
}

/// Hands a finished document to the customer (download, file, ...).
pub trait ReceiptSink {
    /// Deliver `document`.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Delivery`] if the document cannot be handed over.
    fn deliver(&mut self, document: ReceiptDocument) -> Result<(), ReceiptError>;
}

/// A rendered receipt ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One ordered product on the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub subtotal: Price,
}

impl ReceiptLine {
    /// `name xQTY - Rs.subtotal`, using the ASCII currency symbol.
    #[must_use]
    pub fn describe_ascii(&self) -> String {
        format!(
            "{} x{} - {}",
            self.name,
            self.quantity,
            self.subtotal.display_ascii()
        )
    }
}

/// Text placed at a fixed position on a receipt page.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedText {
    /// Zero-based page index.
    pub page: usize,
    /// Millimetres from the left edge.
    pub x_mm: f32,
    /// Millimetres from the top edge.
    pub y_mm: f32,
    pub bold: bool,
    pub text: String,
}

/// Page geometry of the receipt (A4, millimetres).
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_X_MM: f32 = 20.0;
const FIRST_LINE_MM: f32 = 20.0;
const LINE_STEP_MM: f32 = 10.0;
const LAST_LINE_MM: f32 = 280.0;

/// Everything printed on an order receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub customer_name: String,
    pub delivery_location: String,
    pub estimated_minutes: u32,
    pub lines: Vec<ReceiptLine>,
    pub total: Price,
}

impl Receipt {
    /// Build a receipt from the current cart lines.
    #[must_use]
    pub fn from_cart<S>(
        cart: &CartStore<S>,
        customer_name: &str,
        delivery_location: &str,
        estimated_minutes: u32,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            customer_name: customer_name.to_string(),
            delivery_location: delivery_location.to_string(),
            estimated_minutes,
            lines: cart
                .lines()
                .iter()
                .map(|line| ReceiptLine {
                    name: line.product.name.clone(),
                    quantity: line.quantity,
                    subtotal: Price::new(line.subtotal(), currency),
                })
                .collect(),
            total: cart.total(currency),
        }
    }

    /// Download filename: `Order_Receipt_<name>.pdf`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("Order_Receipt_{}.pdf", filename_component(&self.customer_name))
    }

    /// Receipt text laid out on A4 pages, top-origin millimetres.
    ///
    /// Uses the ASCII currency symbol so builtin document fonts can encode
    /// every character.
    #[must_use]
    pub fn layout(&self) -> Vec<PositionedText> {
        let mut cursor = LayoutCursor::default();
        let mut out = Vec::with_capacity(self.lines.len() + 7);

        out.push(cursor.place("Order Receipt", true));
        out.push(cursor.place(&format!("Customer Name: {}", self.customer_name), false));
        out.push(cursor.place(
            &format!("Delivery Location: {}", self.delivery_location),
            false,
        ));
        out.push(cursor.place(
            &format!("Estimated Delivery Time: {} minutes", self.estimated_minutes),
            false,
        ));
        out.push(cursor.place("Order Summary:", false));
        for line in &self.lines {
            out.push(cursor.place(&line.describe_ascii(), false));
        }
        cursor.skip();
        out.push(cursor.place(
            &format!("Total Amount: {}", self.total.display_ascii()),
            false,
        ));

        out
    }
}

#[derive(Debug)]
struct LayoutCursor {
    page: usize,
    y_mm: f32,
}

impl Default for LayoutCursor {
    fn default() -> Self {
        Self {
            page: 0,
            y_mm: FIRST_LINE_MM,
        }
    }
}

impl LayoutCursor {
    fn place(&mut self, text: &str, bold: bool) -> PositionedText {
        if self.y_mm > LAST_LINE_MM {
            self.page += 1;
            self.y_mm = FIRST_LINE_MM;
        }
        let placed = PositionedText {
            page: self.page,
            x_mm: MARGIN_X_MM,
            y_mm: self.y_mm,
            bold,
            text: text.to_string(),
        };
        self.y_mm += LINE_STEP_MM;
        placed
    }

    fn skip(&mut self) {
        self.y_mm += LINE_STEP_MM;
    }
}

/// Replace each whitespace run with `_` and path/quote characters with `_`.
fn filename_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        out.push(if matches!(c, '/' | '\\' | '"') { '_' } else { c });
    }
    out
}

/// Result of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The receipt was delivered and the cart cleared.
    Confirmed(Receipt),
    /// Nothing was ordered; the cart is unchanged.
    Aborted(AbortReason),
}

/// The checkout state machine.
#[derive(Debug, Clone)]
pub struct Checkout {
    state: CheckoutState,
    currency: CurrencyCode,
}

impl Checkout {
    /// Create an idle checkout pricing receipts in `currency`.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            state: CheckoutState::Idle,
            currency,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// Run the flow to completion against `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be built or delivered, or if
    /// the emptied cart cannot be persisted. Document failures leave the
    /// cart untouched.
    pub fn run<S, P, W, K, R>(
        &mut self,
        cart: &mut CartStore<S>,
        prompt: &mut P,
        writer: &W,
        sink: &mut K,
        rng: &mut R,
    ) -> Result<CheckoutOutcome, CheckoutError>
    where
        S: KeyValueStore,
        P: CheckoutPrompt + ?Sized,
        W: ReceiptWriter + ?Sized,
        K: ReceiptSink + ?Sized,
        R: Rng,
    {
        self.transition(CheckoutState::Idle);

        if cart.is_empty() {
            prompt.notify(EMPTY_CART_NOTICE);
            return Ok(self.abort(AbortReason::EmptyCart));
        }

        self.transition(CheckoutState::CollectingInput);
        let Some(name) = ask_required(prompt, CheckoutField::CustomerName) else {
            return Ok(self.abort(AbortReason::MissingName));
        };
        let Some(location) = ask_required(prompt, CheckoutField::DeliveryLocation) else {
            return Ok(self.abort(AbortReason::MissingLocation));
        };

        self.transition(CheckoutState::Generating);
        let minutes = rng.random_range(DELIVERY_MINUTES);
        let receipt = Receipt::from_cart(cart, &name, &location, minutes, self.currency);
        let bytes = writer.write(&receipt)?;
        sink.deliver(ReceiptDocument {
            filename: receipt.filename(),
            bytes,
        })?;
        prompt.notify(CONFIRMATION_NOTICE);
        cart.clear()?;

        self.transition(CheckoutState::Confirmed);
        info!(
            lines = receipt.lines.len(),
            total = %receipt.total,
            estimated_minutes = minutes,
            "Checkout confirmed"
        );
        Ok(CheckoutOutcome::Confirmed(receipt))
    }

    fn abort(&mut self, reason: AbortReason) -> CheckoutOutcome {
        self.transition(CheckoutState::Aborted(reason));
        CheckoutOutcome::Aborted(reason)
    }

    fn transition(&mut self, to: CheckoutState) {
        debug!(from = ?self.state, to = ?to, "Checkout transition");
        self.state = to;
    }
}

/// Ask for `field`, treating cancel, empty and blank answers as missing.
fn ask_required<P: CheckoutPrompt + ?Sized>(prompt: &mut P, field: CheckoutField) -> Option<String> {
    prompt
        .ask(field)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
