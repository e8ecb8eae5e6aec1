//! Language Splitter
//!
//! Moves locale-qualified resource values and `#lang_` asset directories
//! into one split per language.

use std::collections::{BTreeMap, BTreeSet};

use r_droid_targeting::device::locale_language;
use r_droid_targeting::{Targeting, TargetingValue};
use tracing::debug;

use super::assets::targeted_directory;
use super::ModuleSplitSplitter;
use crate::module_split::{ModuleEntry, ModuleSplit};
use crate::resources::ResourceTable;
use crate::SplitError;

const LANGUAGE_KEY: &str = "lang";

pub struct LanguageResourcesSplitter;

impl LanguageResourcesSplitter {
    fn languages(split: &ModuleSplit) -> BTreeSet<String> {
        let from_resources = split
            .resource_table
            .iter()
            .flat_map(|t| t.entries())
            .flat_map(|e| e.values.iter())
            .filter_map(|v| v.config.language());
        let from_assets = split
            .entries
            .iter()
            .filter_map(|e| targeted_directory(&e.path, LANGUAGE_KEY))
            .map(|(raw, _)| locale_language(raw))
            .filter(|l| !l.is_empty());
        from_resources.chain(from_assets).collect()
    }
}

impl ModuleSplitSplitter for LanguageResourcesSplitter {
    fn name(&self) -> &'static str {
        "language"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError> {
        if !split.targeting.language.is_empty() {
            return Ok(vec![split]);
        }
        let languages = Self::languages(&split);
        if languages.is_empty() {
            return Ok(vec![split]);
        }

        let asset_language = |entry: &ModuleEntry| {
            targeted_directory(&entry.path, LANGUAGE_KEY).map(|(raw, _)| locale_language(raw))
        };
        let table = split.resource_table.clone().unwrap_or_default();
        let remainder_table = table.filter(|_, value| value.config.language().is_none());
        let kept_files = remainder_table.referenced_files();

        // A file shared by several languages stays with the remainder.
        let mut owners: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for value in table.entries().iter().flat_map(|e| e.values.iter()) {
            if let (Some(file), Some(language)) = (value.file.as_deref(), value.config.language()) {
                owners.entry(file).or_default().insert(language);
            }
        }
        let shared: BTreeSet<&str> = owners
            .into_iter()
            .filter(|(_, languages)| languages.len() > 1)
            .map(|(file, _)| file)
            .collect();

        let mut moved: BTreeSet<String> = BTreeSet::new();
        let mut language_splits = Vec::with_capacity(languages.len());
        for language in &languages {
            let language_table: ResourceTable =
                table.filter(|_, value| value.config.language().as_ref() == Some(language));
            let files = language_table.referenced_files();
            let entries = split.entries_where(|path| {
                files.contains(path) && !kept_files.contains(path) && !shared.contains(path)
            });
            let mut entries: Vec<ModuleEntry> = entries
                .into_iter()
                .chain(
                    split
                        .entries
                        .iter()
                        .filter(|e| asset_language(e).as_ref() == Some(language))
                        .cloned(),
                )
                .collect();
            entries.sort();
            entries.dedup();
            moved.extend(entries.iter().map(|e| e.path.clone()));

            let value = TargetingValue::new(
                [language.clone()],
                languages.iter().filter(|l| *l != language).cloned(),
            )?;
            let targeting = split.targeting.merged_with(&Targeting::new().with_language(value))?;
            language_splits.push(split.derive(entries, Some(language_table), targeting));
        }

        let remainder_entries = split.entries_where(|path| !moved.contains(path));
        debug!("{}: {} language split(s)", split.module_name, language_splits.len());

        let had_table = split.resource_table.is_some();
        let rest = ModuleSplit {
            entries: remainder_entries,
            resource_table: had_table.then_some(remainder_table),
            ..split
        };
        let mut outputs = Vec::with_capacity(language_splits.len() + 1);
        if rest.is_master_split || !rest.is_empty() {
            outputs.push(rest);
        }
        outputs.extend(language_splits);
        Ok(outputs)
    }
}
