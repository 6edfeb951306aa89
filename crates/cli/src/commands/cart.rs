//! `kirana cart` - inspect and change the persisted cart.

use std::io::Write;

use kirana_core::{CartStore, CurrencyCode, ProductId, render};
use tracing::info;

use super::{CliError, Context};

/// Print the cart.
pub fn show(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let cart = ctx.open_cart()?;
    write_cart(out, &cart, ctx.currency())?;
    Ok(())
}

/// Add a product from the catalog, or add one more of it.
pub async fn add(ctx: &Context, id: ProductId, out: &mut impl Write) -> Result<(), CliError> {
    let catalog = ctx.fetch_catalog().await?;
    let mut cart = ctx.open_cart()?;

    match cart.add_or_increment(&catalog, id)? {
        Some(quantity) => info!(product_id = %id, quantity, "Added to cart"),
        None => writeln!(out, "No product with ID {id} in the catalog.")?,
    }
    write_cart(out, &cart, ctx.currency())?;
    Ok(())
}

/// Change a line's quantity by `delta`; lines reaching zero are removed.
pub fn update(ctx: &Context, id: ProductId, delta: i64, out: &mut impl Write) -> Result<(), CliError> {
    let mut cart = ctx.open_cart()?;
    let quantity = cart.change_quantity(id, delta)?;
    info!(product_id = %id, delta, quantity = ?quantity, "Cart quantity changed");
    write_cart(out, &cart, ctx.currency())?;
    Ok(())
}

/// Remove a line.
pub fn remove(ctx: &Context, id: ProductId, out: &mut impl Write) -> Result<(), CliError> {
    let mut cart = ctx.open_cart()?;
    if !cart.remove(id)? {
        writeln!(out, "Product {id} is not in the cart.")?;
    }
    write_cart(out, &cart, ctx.currency())?;
    Ok(())
}

/// Write the cart lines, badge count and subtotal.
pub fn write_cart<S>(
    out: &mut impl Write,
    cart: &CartStore<S>,
    currency: CurrencyCode,
) -> std::io::Result<()> {
    let panel = render::cart_panel(cart, currency);
    let badge = render::badge(cart);

    if panel.is_empty() {
        writeln!(out, "{}", panel.empty_message())?;
    }
    for line in &panel.lines {
        writeln!(
            out,
            "{:>5}  {:<28} {:>10} x{:<3} {:>10}",
            line.id, line.name, line.unit_price, line.quantity, line.line_price
        )?;
    }
    writeln!(
        out,
        "Items: {}  Subtotal: {}",
        badge.count,
        render::subtotal(cart, currency)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::super::tests::{CHAI_CART, context};
    use super::*;

    #[test]
    fn test_show_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();

        show(&context(dir.path()), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Your cart is empty"));
        assert!(text.contains("Items: 0  Subtotal: ₹0.00"));
    }

    #[test]
    fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cart.json"), CHAI_CART).unwrap();
        let ctx = context(dir.path());
        let mut out = Vec::new();

        update(&ctx, ProductId::new(1), 1, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Items: 3  Subtotal: ₹30.00"));
        assert_eq!(ctx.open_cart().unwrap().item_count(), 3);
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cart.json"), CHAI_CART).unwrap();
        let ctx = context(dir.path());

        update(&ctx, ProductId::new(1), -2, &mut Vec::new()).unwrap();

        assert!(ctx.open_cart().unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cart.json"), CHAI_CART).unwrap();
        let ctx = context(dir.path());
        let mut out = Vec::new();

        remove(&ctx, ProductId::new(9), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Product 9 is not in the cart."));
        assert_eq!(ctx.open_cart().unwrap().item_count(), 2);
    }
}
