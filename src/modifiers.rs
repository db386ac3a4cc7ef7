//! Per-dataset modification parameters and the bank that preserves them
//! across dataset switches.

use crate::models::{Overwrite, Selection};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Spread/shift/blend/overwrite parameters applied server-side to the
/// raw forecast. Defaults mean "no modification".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Scale factor on the ensemble spread.
    pub spread: f64,
    /// Additive offset.
    pub shift: f64,
    /// Blending weight toward climatology, in percent.
    pub blend: f64,
    pub overwrites: Vec<Overwrite>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            spread: 1.0,
            shift: 0.0,
            blend: 0.0,
            overwrites: Vec::new(),
        }
    }
}

impl Modifiers {
    /// True iff applying these modifiers would change the forecast, i.e.
    /// a recompute is needed to reflect them.
    pub fn is_modified(&self) -> bool {
        self.spread != 1.0 || self.shift != 0.0 || self.blend != 0.0 || !self.overwrites.is_empty()
    }
}

/// One saved [`Modifiers`] slot per period/variable combination. All
/// four slots exist from construction; switching datasets saves the live
/// values into the outgoing slot and restores the incoming one.
#[derive(Debug, Clone)]
pub struct ModifierBank {
    slots: HashMap<Selection, Modifiers>,
}

impl Default for ModifierBank {
    fn default() -> Self {
        let slots = Selection::all()
            .into_iter()
            .map(|sel| (sel, Modifiers::default()))
            .collect();
        Self { slots }
    }
}

impl ModifierBank {
    /// Copy the live values into the slot for `selection`.
    pub fn save(&mut self, selection: Selection, live: &Modifiers) {
        self.slots.insert(selection, live.clone());
    }

    /// Restore the slot for `selection` into the live values. Returns
    /// true iff the restored slot holds a non-default modification, in
    /// which case the caller must trigger a recompute so the previously
    /// applied modifications become visible again.
    pub fn load(&self, selection: Selection, live: &mut Modifiers) -> bool {
        let slot = self
            .slots
            .get(&selection)
            .cloned()
            .unwrap_or_default();
        *live = slot;
        live.is_modified()
    }

    pub fn get(&self, selection: Selection) -> &Modifiers {
        // Every selection is seeded in `default`, so the lookup cannot miss.
        &self.slots[&selection]
    }
}

/// Parse the per-member overwrite input fields. Blank fields record no
/// overwrite (not a zero); the rest must parse as numbers. Field `i`
/// belongs to member index `i`, so indices never exceed the member count.
pub fn parse_overwrites(fields: &[String], member_count: usize) -> Result<Vec<Overwrite>> {
    let mut overwrites = Vec::new();
    for (index, field) in fields.iter().enumerate().take(member_count) {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let value: f64 = match field.parse() {
            Ok(v) => v,
            Err(_) => bail!("overwrite for member {} is not a number: {}", index, field),
        };
        overwrites.push(Overwrite { index, value });
    }
    Ok(overwrites)
}
