use colored::Colorize;
use serde_json::json;

use draw_sdk::{
    DrawConstants, Identity, LedgerEvent, PurchaseFailure, Receipt, RenderSink, SlotAction,
    SlotState, ViewModel,
};

use crate::cli::OutputFormat;

const GRID_COLUMNS: usize = 4;

pub fn sink(format: OutputFormat) -> Box<dyn RenderSink> {
    match format {
        OutputFormat::Text => Box::new(TextSink),
        OutputFormat::Json => Box::new(JsonSink),
    }
}

/// Human-readable output with a ticket grid.
pub struct TextSink;

impl RenderSink for TextSink {
    fn render(&mut self, view: &ViewModel, _actions: &[SlotAction]) {
        println!("{}", format_view(view));
    }

    fn render_failure(&mut self, failure: &PurchaseFailure) {
        eprintln!("{} {}", "✗".red().bold(), failure);
    }
}

/// One JSON object per line.
pub struct JsonSink;

impl RenderSink for JsonSink {
    fn render(&mut self, view: &ViewModel, actions: &[SlotAction]) {
        let buy: Vec<u32> = actions.iter().map(|a| a.slot.get()).collect();
        println!("{}", json!({ "view": view, "buy": buy }));
    }

    fn render_failure(&mut self, failure: &PurchaseFailure) {
        println!("{}", json!({ "failure": failure.to_string() }));
    }
}

pub fn format_view(view: &ViewModel) -> String {
    let mut out = format!(
        "Draw {}  {}/{} sold\n",
        view.draw_id.to_string().bold(),
        view.sold_count,
        view.tickets_per_draw
    );
    if let Some(viewer) = &view.viewer {
        out.push_str(&format!("Wallet {}\n", viewer.short().cyan()));
    }
    out.push('\n');
    out.push_str(&format_grid(view));
    out.push('\n');
    out.push_str("Your tickets:\n");
    out.push_str(&format_owned(view));
    out
}

pub fn format_grid(view: &ViewModel) -> String {
    let mut out = String::new();
    for row in view.slots.chunks(GRID_COLUMNS) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| {
                let label = format!("{:<6}", state_label(cell.state));
                let label = match cell.state {
                    SlotState::Available => label.green(),
                    SlotState::SoldToOther => label.dimmed(),
                    SlotState::OwnedByViewer => label.yellow().bold(),
                };
                format!("{:>4} {}", cell.slot.to_string(), label)
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn format_owned(view: &ViewModel) -> String {
    if view.viewer_slots.is_empty() {
        return "  No tickets owned yet.\n".to_string();
    }
    view.viewer_slots
        .iter()
        .map(|slot| format!("  Ticket {slot}\n"))
        .collect()
}

pub fn format_prizes(constants: &DrawConstants) -> String {
    format!(
        "Ticket price {}  Winner prize {}  Creator prize {}",
        constants.ticket_price.to_string().bold(),
        constants.winner_prize.to_string().green(),
        constants.creator_prize.to_string()
    )
}

pub fn format_receipt(receipt: &Receipt) -> String {
    format!(
        "{} Bought ticket {} in draw {} (tx {}, block {})",
        "✓".green().bold(),
        receipt.slot.to_string().yellow(),
        receipt.draw,
        receipt.tx_hash,
        receipt.block
    )
}

pub fn receipt_json(receipt: &Receipt) -> serde_json::Value {
    json!({
        "draw": receipt.draw,
        "slot": receipt.slot.get(),
        "tx": receipt.tx_hash.to_hex(),
        "block": receipt.block,
    })
}

/// Announcement for the events `watch` reports, `None` for the rest.
pub fn format_event(event: &LedgerEvent, viewer: &Identity) -> Option<String> {
    match event {
        LedgerEvent::DrawCompleted {
            draw,
            winner,
            winning_slot,
        } if winner == viewer => Some(format!(
            "{} You won draw {} with ticket {}!",
            "★".yellow().bold(),
            draw,
            winning_slot
        )),
        LedgerEvent::DrawCompleted {
            draw,
            winner,
            winning_slot,
        } => Some(format!(
            "Draw {} completed: ticket {} won by {}",
            draw,
            winning_slot,
            winner.short()
        )),
        LedgerEvent::DrawTimedOut { draw } => Some(format!("Draw {draw} timed out")),
        _ => None,
    }
}

fn state_label(state: SlotState) -> &'static str {
    match state {
        SlotState::Available => "Buy",
        SlotState::SoldToOther => "Sold",
        SlotState::OwnedByViewer => "Owned",
    }
}
