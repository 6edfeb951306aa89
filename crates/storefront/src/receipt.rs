//! PDF receipt rendering with `printpdf`.
//!
//! Places the receipt layout produced by the core crate on A4 pages using
//! the builtin Helvetica fonts. Layout coordinates are top-origin; PDF
//! coordinates are bottom-origin, so y is flipped here.

use kirana_core::checkout::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use kirana_core::{Receipt, ReceiptError, ReceiptWriter};
use printpdf::{BuiltinFont, Mm, PdfDocument};

const FONT_SIZE_PT: f32 = 12.0;

/// Renders receipts as PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReceiptWriter;

impl ReceiptWriter for PdfReceiptWriter {
    fn write(&self, receipt: &Receipt) -> Result<Vec<u8>, ReceiptError> {
        let (doc, first_page, first_layer) = PdfDocument::new(
            "Order Receipt",
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(document_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(document_error)?;

        let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];

        for text in receipt.layout() {
            while layers.len() <= text.page {
                let (page, layer) = doc.add_page(
                    Mm(PAGE_WIDTH_MM),
                    Mm(PAGE_HEIGHT_MM),
                    format!("Layer {}", layers.len() + 1),
                );
                layers.push(doc.get_page(page).get_layer(layer));
            }
            let Some(layer) = layers.get(text.page) else {
                continue;
            };

            let font = if text.bold { &bold } else { &regular };
            layer.use_text(
                text.text,
                FONT_SIZE_PT,
                Mm(text.x_mm),
                Mm(PAGE_HEIGHT_MM - text.y_mm),
                font,
            );
        }

        doc.save_to_bytes().map_err(document_error)
    }
}

fn document_error(e: impl std::fmt::Display) -> ReceiptError {
    ReceiptError::Document(e.to_string())
}
