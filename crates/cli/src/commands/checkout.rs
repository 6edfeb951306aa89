//! `kirana checkout` - collect delivery details and write the PDF receipt.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use dialoguer::{Error as DialoguerError, Input};
use kirana_core::{
    Checkout, CheckoutField, CheckoutOutcome, CheckoutPrompt, ReceiptDocument, ReceiptError,
    ReceiptSink,
};
use kirana_storefront::receipt::PdfReceiptWriter;
use tracing::{info, warn};

use super::{CliError, Context};

/// Asks checkout questions on the terminal.
///
/// Each prompt is pre-filled with a suggestion; clearing it and pressing
/// enter, or interrupting, cancels checkout.
pub struct TerminalPrompt<W> {
    notices: W,
}

impl<W: Write> TerminalPrompt<W> {
    pub const fn new(notices: W) -> Self {
        Self { notices }
    }
}

impl<W: Write> CheckoutPrompt for TerminalPrompt<W> {
    fn ask(&mut self, field: CheckoutField) -> Option<String> {
        let answer = Input::<String>::new()
            .with_prompt(field.prompt())
            .with_initial_text(field.suggestion())
            .allow_empty(true)
            .interact_text();

        match answer {
            Ok(value) => Some(value),
            Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => None,
            Err(err) => {
                warn!(error = %err, "Failed to read checkout input");
                None
            }
        }
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.notices, "{message}") {
            warn!(error = %e, "Failed to show checkout notice");
        }
    }
}

/// Writes receipts into a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Option<PathBuf>,
}

impl DirectorySink {
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir, written: None }
    }

    /// Path of the last receipt written.
    pub fn written(&self) -> Option<&std::path::Path> {
        self.written.as_deref()
    }
}

impl ReceiptSink for DirectorySink {
    fn deliver(&mut self, document: ReceiptDocument) -> Result<(), ReceiptError> {
        let delivery = |e: std::io::Error| ReceiptError::Delivery(e.to_string());

        fs::create_dir_all(&self.dir).map_err(delivery)?;
        let path = self.dir.join(&document.filename);
        fs::write(&path, &document.bytes).map_err(delivery)?;

        info!(path = %path.display(), bytes = document.bytes.len(), "Receipt written");
        self.written = Some(path);
        Ok(())
    }
}

/// Run checkout against the persisted cart.
pub fn run(
    ctx: &Context,
    prompt: &mut impl CheckoutPrompt,
    out_dir: PathBuf,
    out: &mut impl Write,
) -> Result<CheckoutOutcome, CliError> {
    let mut cart = ctx.open_cart()?;
    let mut sink = DirectorySink::new(out_dir);

    let outcome = Checkout::new(ctx.currency()).run(
        &mut cart,
        prompt,
        &PdfReceiptWriter,
        &mut sink,
        &mut rand::rng(),
    )?;

    match &outcome {
        CheckoutOutcome::Confirmed(receipt) => {
            if let Some(path) = sink.written() {
                writeln!(out, "Receipt saved to {}", path.display())?;
            }
            writeln!(
                out,
                "Total: {}  Estimated delivery: {} minutes",
                receipt.total, receipt.estimated_minutes
            )?;
        }
        CheckoutOutcome::Aborted(reason) => writeln!(out, "{}", reason.notice())?,
    }
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;

    use kirana_core::AbortReason;
    use kirana_core::checkout::{CONFIRMATION_NOTICE, EMPTY_CART_NOTICE};

    use super::super::tests::{CHAI_CART, context};
    use super::*;

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<Option<String>>,
        notices: Vec<String>,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(String::from)).collect(),
                notices: Vec::new(),
            }
        }
    }

    impl CheckoutPrompt for ScriptedPrompt {
        fn ask(&mut self, _field: CheckoutField) -> Option<String> {
            self.answers.pop_front().flatten()
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn test_checkout_writes_receipt_and_clears_cart() {
        let data = tempfile::tempdir().unwrap();
        let receipts = tempfile::tempdir().unwrap();
        fs::write(data.path().join("cart.json"), CHAI_CART).unwrap();
        let ctx = context(data.path());
        let mut prompt = ScriptedPrompt::answering(&[Some("Asha Rao"), Some("CBN Colony")]);
        let mut out = Vec::new();

        let outcome = run(&ctx, &mut prompt, receipts.path().to_path_buf(), &mut out).unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Confirmed(_)));
        let receipt = receipts.path().join("Order_Receipt_Asha_Rao.pdf");
        assert!(fs::read(&receipt).unwrap().starts_with(b"%PDF"));
        assert!(ctx.open_cart().unwrap().is_empty());
        assert_eq!(prompt.notices, vec![CONFIRMATION_NOTICE.to_string()]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total: ₹20.00"));
    }

    #[test]
    fn test_checkout_cancelled_keeps_cart() {
        let data = tempfile::tempdir().unwrap();
        let receipts = tempfile::tempdir().unwrap();
        fs::write(data.path().join("cart.json"), CHAI_CART).unwrap();
        let ctx = context(data.path());
        let mut prompt = ScriptedPrompt::answering(&[Some("Asha Rao"), None]);

        let outcome = run(&ctx, &mut prompt, receipts.path().to_path_buf(), &mut Vec::new()).unwrap();

        assert_eq!(outcome, CheckoutOutcome::Aborted(AbortReason::MissingLocation));
        assert_eq!(ctx.open_cart().unwrap().item_count(), 2);
        assert_eq!(fs::read_dir(receipts.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_checkout_empty_cart() {
        let data = tempfile::tempdir().unwrap();
        let ctx = context(data.path());
        let mut prompt = ScriptedPrompt::default();
        let mut out = Vec::new();

        let outcome = run(&ctx, &mut prompt, data.path().join("receipts"), &mut out).unwrap();

        assert_eq!(outcome, CheckoutOutcome::Aborted(AbortReason::EmptyCart));
        assert_eq!(prompt.notices, vec![EMPTY_CART_NOTICE.to_string()]);
        assert!(!data.path().join("receipts").exists());
    }

    #[test]
    fn test_terminal_prompt_notify_writes_line() {
        let mut prompt = TerminalPrompt::new(Vec::new());
        prompt.notify("Your cart is empty!");
        assert_eq!(prompt.notices, b"Your cart is empty!\n");
    }
}
