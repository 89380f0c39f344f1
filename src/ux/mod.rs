use colored::Colorize;
use std::io::{self, Write};

use crate::log::SavedPaths;
use crate::order::{Generation, Order};
use crate::prompt::PromptResult;
use crate::selection::{catalog, Selection, Slot, NO_JELLY_LABEL};
use crate::store::PromptConfigRecord;

pub fn show_options() {
    println!("\n=== OPTIONS ===");
    for slot in Slot::ALL {
        println!("{} {}", slot.title().bold(), format!("(--{})", flag_name(slot)).dimmed());
        for o in catalog::options(slot) {
            match o.color {
                Some(hex) => println!("  {:<12} {}  {}", o.id.cyan(), o.label, hex.dimmed()),
                None => println!("  {:<12} {}", o.id.cyan(), o.label),
            }
        }
    }
    println!();
}

fn flag_name(slot: Slot) -> &'static str {
    match slot {
        Slot::ChocolateType => "chocolate",
        Slot::Base => "base",
        Slot::Ganache => "ganache",
        Slot::Jelly => "jelly",
        Slot::ShellColor => "color",
    }
}

pub fn show_selection(sel: &Selection) {
    println!("\n=== SELECTION ===");
    for slot in Slot::ALL {
        let value = match sel.label(slot) {
            Some(l) => l.normal(),
            None if slot == Slot::Jelly => NO_JELLY_LABEL.dimmed(),
            None => "Não selecionado".yellow(),
        };
        println!("  {:<18} {}", slot.title(), value);
    }
    if !sel.is_complete() {
        println!("{}", "Complete sua personalização para gerar o bombom.".yellow());
    }
}

pub fn show_prompt(prompt: &PromptResult, translated: Option<&str>) {
    println!("\n=== PROMPT ===");
    println!("{}", prompt.prompt);
    println!("\n{}", "Negative prompt:".bold());
    println!("{}", prompt.negative_prompt);
    if let Some(english) = translated {
        println!("\n{}", "Sent to image API:".bold());
        println!("{}", english.green());
    }
    println!();
}

pub fn show_template(record: &PromptConfigRecord) {
    println!("\n=== TEMPLATE {} ===", record.id.to_string().dimmed());
    println!("{} {}", "created:".bold(), record.created_at.to_rfc3339());
    println!("{}\n{}", "base prompt:".bold(), record.template.base_prompt);
    println!("{}\n{}", "negative prompt:".bold(), record.template.negative_prompt);
    println!();
}

pub fn show_generation(gen: &Generation, saved: &SavedPaths) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━ Generated ━━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {}: {}   {}: {}   {}: {}B",
        "Seed".cyan().bold(), gen.request.seed,
        "Format".cyan().bold(), gen.image.mime,
        "Payload".cyan().bold(), gen.image.base64.len()
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
    println!("image: {}", saved.image.display().to_string().green());
    println!("artifacts: {}", saved.dir.display());
}

pub fn show_order(order: &Order) {
    println!(
        "{}  {}  {}",
        order.id.to_string().dimmed(),
        order.created_at.format("%Y-%m-%d %H:%M"),
        summary(&order.selection).bold()
    );
    if let Some(p) = &order.image_path {
        println!("  image: {}", p);
    }
}

pub fn show_orders(orders: &[Order]) {
    println!("\n=== ORDERS ({}) ===", orders.len());
    if orders.is_empty() {
        println!("(no orders)");
    }
    for o in orders {
        show_order(o);
    }
    println!();
}

/// One-line "chocolate • color • base • ganache • jelly" summary.
pub fn summary(sel: &Selection) -> String {
    [Slot::ChocolateType, Slot::ShellColor, Slot::Base, Slot::Ganache, Slot::Jelly]
        .into_iter()
        .filter_map(|slot| sel.label(slot))
        .collect::<Vec<_>>()
        .join(" • ")
}

/// English or Portuguese yes; anything else, blank included, is a no.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "sim")
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().ok();
    let mut answer = String::new();
    io::stdin().read_line(&mut answer).is_ok() && is_yes(&answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Attribute, ShellColor};

    #[test]
    fn summary_skips_absent_slots() {
        let sel = Selection {
            chocolate_type: Some(Attribute::new("milk", "Chocolate ao Leite")),
            shell_color: Some(ShellColor { id: "red".into(), label: "Vermelho".into(), color: None }),
            ganache: Some(Attribute::new("coffee", "Ganache de Café")),
            ..Default::default()
        };
        assert_eq!(summary(&sel), "Chocolate ao Leite • Vermelho • Ganache de Café");
        assert_eq!(summary(&Selection::default()), "");
    }

    #[test]
    fn confirm_answers() {
        for yes in ["y\n", "YES", " Sim \n", "s"] {
            assert!(is_yes(yes), "{yes:?}");
        }
        for no in ["", "\n", "n", "nao", "yep"] {
            assert!(!is_yes(no), "{no:?}");
        }
    }
}
