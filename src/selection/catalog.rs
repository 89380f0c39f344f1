use super::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOption {
    pub id: &'static str,
    pub label: &'static str,
    pub color: Option<&'static str>,
}

const fn opt(id: &'static str, label: &'static str) -> CatalogOption {
    CatalogOption { id, label, color: None }
}

const fn tinted(id: &'static str, label: &'static str, color: &'static str) -> CatalogOption {
    CatalogOption { id, label, color: Some(color) }
}

const CHOCOLATE_TYPES: &[CatalogOption] = &[
    opt("milk", "Chocolate ao Leite"),
    opt("semisweet", "Chocolate Meio Amargo"),
    opt("white", "Chocolate Branco"),
    opt("cocoa70", "Chocolate 70% Cacau"),
];

const BASES: &[CatalogOption] = &[
    opt("cookie", "Biscoito Triturado"),
    opt("nuts", "Castanha Triturada"),
    opt("coconut", "Coco Ralado"),
    opt("none", "Sem Base"),
];

const GANACHES: &[CatalogOption] = &[
    opt("chocolate", "Ganache de Chocolate"),
    opt("caramel", "Ganache de Caramelo"),
    opt("berries", "Ganache de Frutas Vermelhas"),
    opt("passion", "Ganache de Maracujá"),
    opt("coffee", "Ganache de Café"),
];

const JELLIES: &[CatalogOption] = &[
    opt("none", "Sem Geleia"),
    opt("strawberry", "Geleia de Morango"),
    opt("raspberry", "Geleia de Framboesa"),
    opt("passion", "Geleia de Maracujá"),
    opt("apricot", "Geleia de Damasco"),
];

const SHELL_COLORS: &[CatalogOption] = &[
    tinted("pink", "Rosa", "#FFB6C1"),
    tinted("blue", "Azul", "#87CEEB"),
    tinted("green", "Verde", "#98FB98"),
    tinted("yellow", "Amarelo", "#FFE066"),
    tinted("purple", "Roxo", "#DDA0DD"),
    tinted("orange", "Laranja", "#FFA94D"),
    tinted("red", "Vermelho", "#FF6B6B"),
    tinted("white", "Branco", "#FAFAFA"),
];

/// Fixed product options offered for a slot.
pub fn options(slot: Slot) -> &'static [CatalogOption] {
    match slot {
        Slot::ChocolateType => CHOCOLATE_TYPES,
        Slot::Base => BASES,
        Slot::Ganache => GANACHES,
        Slot::Jelly => JELLIES,
        Slot::ShellColor => SHELL_COLORS,
    }
}

pub fn lookup(slot: Slot, id: &str) -> Option<&'static CatalogOption> {
    options(slot).iter().find(|o| o.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_per_slot() {
        for slot in Slot::ALL {
            let ids: HashSet<_> = options(slot).iter().map(|o| o.id).collect();
            assert_eq!(ids.len(), options(slot).len(), "duplicate id in {slot}");
        }
    }

    #[test]
    fn only_shell_colors_carry_color_codes() {
        for slot in Slot::ALL {
            let tinted = options(slot).iter().all(|o| o.color.is_some());
            assert_eq!(tinted, slot == Slot::ShellColor);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(lookup(Slot::ShellColor, "red").map(|o| o.label), Some("Vermelho"));
        assert!(lookup(Slot::Ganache, "vanilla").is_none());
    }
}
