//! `kirana catalog` - list products.

use std::io::Write;

use kirana_core::render::{self, ProductCardView};
use kirana_core::{CategoryFilter, NoCooldown};

use super::{CliError, Context};

/// Fetch the catalog and list the products matching `category`.
pub async fn list(ctx: &Context, category: Option<&str>, out: &mut impl Write) -> Result<(), CliError> {
    let catalog = ctx.fetch_catalog().await?;
    let cart = ctx.open_cart()?;
    let filter = CategoryFilter::from_optional(category);

    let cards = render::product_grid(&catalog.filter(&filter), &cart, &NoCooldown, ctx.currency());
    write_grid(out, &filter, &catalog.categories(), &cards)?;
    Ok(())
}

/// Write the category bar and one row per product card.
pub fn write_grid(
    out: &mut impl Write,
    filter: &CategoryFilter,
    categories: &[&str],
    cards: &[ProductCardView],
) -> std::io::Result<()> {
    let mut bar = vec![mark(CategoryFilter::All.label(), *filter == CategoryFilter::All)];
    bar.extend(
        categories
            .iter()
            .map(|c| mark(c, *filter != CategoryFilter::All && filter.matches(c))),
    );
    writeln!(out, "Categories: {}", bar.join("  "))?;

    if cards.is_empty() {
        writeln!(out, "No products in this category.")?;
        return Ok(());
    }

    for card in cards {
        writeln!(
            out,
            "{:>5}  {:<28} {:>10}  {:<14} {}",
            card.id, card.name, card.price, card.category, card.button_label
        )?;
    }
    Ok(())
}

fn mark(label: &str, active: bool) -> String {
    if active {
        format!("[{label}]")
    } else {
        label.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kirana_core::ProductId;

    use super::*;

    fn card(id: i64, name: &str, label: &str) -> ProductCardView {
        ProductCardView {
            id: ProductId::new(id),
            name: name.to_string(),
            price: "₹10.00".to_string(),
            category: "Snacks".to_string(),
            description: String::new(),
            image_url: String::new(),
            button_label: label.to_string(),
            in_cart: label != "Add to Cart",
            disabled: false,
            cooldown_ms: 0,
        }
    }

    #[test]
    fn test_write_grid_marks_active_category() {
        let mut out = Vec::new();
        write_grid(
            &mut out,
            &CategoryFilter::parse("Snacks"),
            &["Snacks", "Beverages"],
            &[card(1, "Samosa", "Added (2)")],
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Categories: All  [Snacks]  Beverages\n"));
        assert!(text.contains("Samosa"));
        assert!(text.contains("Added (2)"));
    }

    #[test]
    fn test_write_grid_empty() {
        let mut out = Vec::new();
        write_grid(&mut out, &CategoryFilter::All, &[], &[]).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[All]"));
        assert!(text.contains("No products in this category."));
    }
}
