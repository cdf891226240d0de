use crate::{
    entity::{order_items, orders},
    models::OrderStatus,
    pricing::format_rupiah,
};

fn push_items(lines: &mut Vec<String>, items: &[order_items::Model]) {
    for item in items {
        lines.push(format!(
            "- {} x{} = {}",
            item.product_name_snapshot,
            item.qty,
            format_rupiah(item.line_total)
        ));
    }
}

fn push_totals(lines: &mut Vec<String>, order: &orders::Model, items: &[order_items::Model]) {
    let subtotal: i64 = items.iter().map(|item| item.line_total).sum();
    lines.push(String::new());
    lines.push(format!("Subtotal: {}", format_rupiah(subtotal)));
    if order.voucher_discount > 0 {
        lines.push(format!(
            "Voucher ({}): -{}",
            order.voucher_code.as_deref().unwrap_or("-"),
            format_rupiah(order.voucher_discount)
        ));
    }
    lines.push(format!("Total: {}", format_rupiah(order.total_amount)));
}

fn order_ref(order: &orders::Model) -> String {
    order
        .order_code
        .clone()
        .unwrap_or_else(|| order.id.to_string())
}

pub fn proof_received_admin(
    store_name: &str,
    order: &orders::Model,
    items: &[order_items::Model],
    proof_url: &str,
) -> String {
    let mut lines = vec![
        format!("New payment proof received ({store_name})."),
        String::new(),
        format!("Order: {}", order_ref(order)),
        format!("Name: {}", order.customer_name),
        format!("WhatsApp: {}", order.customer_whatsapp),
        String::new(),
        "Items:".to_string(),
    ];
    push_items(&mut lines, items);
    push_totals(&mut lines, order, items);
    lines.push(format!("Payment proof: {proof_url}"));
    lines.join("\n")
}

pub fn proof_received_customer(order: &orders::Model, items: &[order_items::Model]) -> String {
    let mut lines = vec![
        "Thank you! We have received your payment proof.".to_string(),
        "Your order will be processed shortly.".to_string(),
        String::new(),
        format!("Order: {}", order_ref(order)),
        format!("Name: {}", order.customer_name),
        String::new(),
        "Order details:".to_string(),
    ];
    push_items(&mut lines, items);
    push_totals(&mut lines, order, items);
    lines.push("Status: awaiting verification.".to_string());
    lines.join("\n")
}

pub fn status_changed(
    order: &orders::Model,
    items: &[order_items::Model],
    status: OrderStatus,
) -> String {
    let headline = match status {
        OrderStatus::Paid => "Your payment has been verified. We are preparing your order.",
        OrderStatus::Delivered => "Your order has been delivered.",
        OrderStatus::InvalidPayment => {
            "We could not verify your payment. Please contact us to resolve it."
        }
        OrderStatus::Refund => "Your order has been refunded.",
        OrderStatus::Cancelled => "Your order has been cancelled.",
        OrderStatus::PendingPayment => "Your order is awaiting payment.",
    };

    let mut lines = vec![
        headline.to_string(),
        String::new(),
        format!("Order: {}", order_ref(order)),
        format!("Name: {}", order.customer_name),
        String::new(),
        "Items:".to_string(),
    ];
    push_items(&mut lines, items);
    lines.push(format!("Total: {}", format_rupiah(order.total_amount)));
    lines.push(format!("Status: {status}"));

    if status == OrderStatus::Delivered {
        let details = [
            ("Account", &order.fulfillment_account),
            ("Email", &order.fulfillment_email),
            ("Password", &order.fulfillment_password),
            ("Link", &order.fulfillment_link),
            ("Notes", &order.fulfillment_notes),
        ];
        let filled: Vec<String> = details
            .iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| format!("{label}: {v}"))
            })
            .collect();
        if !filled.is_empty() {
            lines.push(String::new());
            lines.push("Access details:".to_string());
            lines.extend(filled);
        }
    }

    lines.join("\n")
}
