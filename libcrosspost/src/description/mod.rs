//! Description pipeline
//!
//! Turns the override/default description pair into the final text for one
//! destination. The stage order is load-bearing: shortcut substitution must
//! run between the destination's preparse and main parse, because the main
//! parse may convert or escape link syntax.

pub mod ad;
pub mod username;

use crate::config::PostingConfig;
use crate::destinations::Destination;
use crate::shortcuts::ShortcutRegistry;
use crate::types::DescriptionData;

/// Pure transformation chain over a description pair.
pub struct DescriptionPipeline<'a> {
    destination: &'a dyn Destination,
    shortcuts: &'a ShortcutRegistry,
    settings: &'a PostingConfig,
}

impl<'a> DescriptionPipeline<'a> {
    pub fn new(
        destination: &'a dyn Destination,
        shortcuts: &'a ShortcutRegistry,
        settings: &'a PostingConfig,
    ) -> Self {
        Self {
            destination,
            shortcuts,
            settings,
        }
    }

    /// Run the chain: select source text, destination preparse, shortcut
    /// expansion, destination main parse, then advertisement insertion when
    /// the destination allows it and the settings opt in.
    pub fn run(&self, default: &DescriptionData, part: &DescriptionData) -> String {
        let selected = DescriptionData::select(default, part);

        let mut text = self.destination.preparse_description(selected);

        for shortcut in self.shortcuts.iter_all() {
            text = username::expand(&text, &shortcut.key, &shortcut.url);
        }

        text = self.destination.parse_description(&text);

        if self.destination.advertisement_enabled() && self.settings.advertise {
            text = ad::append(&text, |s| self.destination.default_description_parser(s));
        }

        text
    }
}
