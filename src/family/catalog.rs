//! Built-in categories, units, shops and common ingredient names.

pub const CATEGORIES: &[&str] = &[
  "Vegetables 🥬",
  "Fruit 🍎",
  "Meat 🥩",
  "Seafood 🦞",
  "Dairy & Eggs 🥛",
  "Seasoning 🧂",
  "Grains & Oil 🍚",
  "Snacks 🍪",
  "Drinks 🥤",
  "Household 🧴",
  "Other 🛒",
];

pub const UNITS: &[&str] = &[
  "pcs", "g", "kg", "lb", "bag", "box", "bottle", "pack", "can", "roll", "bunch", "head", "dozen",
  "pair", "L", "ml",
];

pub const LOCATIONS: &[&str] = &[
  "🏪 Supermarket",
  "🥬 Market",
  "🛒 Online",
  "🏬 Mall",
  "🥐 Bakery",
  "🥩 Butcher",
  "🐟 Fish market",
  "🍓 Fruit stall",
  "🏠 Have at home",
  "Other",
];

pub const INGREDIENTS: &[&str] = &[
  "Soy sauce",
  "Dark soy sauce",
  "Cooking wine",
  "Rice vinegar",
  "Black vinegar",
  "Sugar",
  "Rock sugar",
  "Salt",
  "Oyster sauce",
  "Sesame oil",
  "White pepper",
  "Sichuan peppercorns",
  "Star anise",
  "Cinnamon",
  "Dried chili",
  "Fermented black beans",
  "Chili bean paste",
  "Sweet bean sauce",
  "Cornstarch",
  "Scallions",
  "Ginger",
  "Garlic",
  "Napa cabbage",
  "Bok choy",
  "Broccoli",
  "Carrots",
  "Potatoes",
  "Tomatoes",
  "Cucumbers",
  "Green peppers",
  "Mushrooms",
  "Tofu",
  "Pork",
  "Chicken",
  "Beef",
  "Eggs",
  "Milk",
  "Bread",
  "Rice",
  "Noodles",
];

/// Ingredient names matching `input`, prefix matches first, then
/// substring matches, each group in catalog order.
pub fn suggest(input: &str, limit: usize) -> Vec<&'static str> {
  let needle = input.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }

  let mut ranked: Vec<(u8, usize, &'static str)> = INGREDIENTS
    .iter()
    .enumerate()
    .filter_map(|(pos, name)| {
      let lower = name.to_lowercase();
      if lower.starts_with(&needle) {
        Some((0, pos, *name))
      } else if lower.contains(&needle) {
        Some((1, pos, *name))
      } else {
        None
      }
    })
    .collect();
  ranked.sort();
  ranked.into_iter().take(limit).map(|(_, _, name)| name).collect()
}

/// Catalog entry equal to `input` ignoring case and emoji decoration.
pub fn canonical<'a>(options: &[&'a str], input: &str) -> Option<&'a str> {
  let wanted = strip_decoration(input);
  options
    .iter()
    .find(|o| strip_decoration(o) == wanted)
    .copied()
}

fn strip_decoration(s: &str) -> String {
  s.chars()
    .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '&')
    .collect::<String>()
    .trim()
    .to_lowercase()
}
