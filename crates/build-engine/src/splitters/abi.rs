//! Native Libraries Splitter
//!
//! Moves `lib/<abi>/` entries into one split per ABI.

use std::collections::BTreeMap;
use std::str::FromStr;

use r_droid_targeting::{Abi, Targeting, TargetingValue};
use tracing::debug;

use super::ModuleSplitSplitter;
use crate::module_split::{ModuleEntry, ModuleSplit};
use crate::SplitError;

const LIB_DIR: &str = "lib/";

/// ABI directory of a native library path, if any
fn abi_directory(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(LIB_DIR)?;
    let (dir, file) = rest.split_once('/')?;
    (!file.is_empty()).then_some(dir)
}

pub struct NativeLibrariesSplitter;

impl ModuleSplitSplitter for NativeLibrariesSplitter {
    fn name(&self) -> &'static str {
        "abi"
    }

    fn split(&self, split: ModuleSplit) -> Result<Vec<ModuleSplit>, SplitError> {
        if !split.targeting.abi.is_empty() {
            return Ok(vec![split]);
        }

        let mut by_abi: BTreeMap<Abi, Vec<ModuleEntry>> = BTreeMap::new();
        let mut remainder: Vec<ModuleEntry> = Vec::new();
        for entry in &split.entries {
            match abi_directory(&entry.path) {
                Some(dir) => {
                    let abi = Abi::from_str(dir).map_err(|_| {
                        SplitError::InvariantViolation(format!(
                            "unrecognized ABI directory '{}' in {}",
                            dir, entry.path
                        ))
                    })?;
                    by_abi.entry(abi).or_default().push(entry.clone());
                }
                None => remainder.push(entry.clone()),
            }
        }
        if by_abi.is_empty() {
            return Ok(vec![split]);
        }
        debug!("{}: native libraries for {} ABI(s)", split.module_name, by_abi.len());

        let abis: Vec<Abi> = by_abi.keys().copied().collect();
        let mut outputs = Vec::with_capacity(abis.len() + 1);
        let mut abi_splits = Vec::with_capacity(abis.len());
        for (abi, entries) in by_abi {
            let value = TargetingValue::new([abi], abis.iter().copied().filter(|a| *a != abi))?;
            let targeting = split.targeting.merged_with(&Targeting::new().with_abi(value))?;
            abi_splits.push(split.derive(entries, None, targeting));
        }

        let rest = ModuleSplit {
            entries: remainder,
            ..split
        };
        if rest.is_master_split || !rest.is_empty() {
            outputs.push(rest);
        }
        outputs.extend(abi_splits);
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(paths: &[&str]) -> ModuleSplit {
        ModuleSplit::for_module(
            "base",
            paths.iter().map(|p| ModuleEntry::new(*p, 100)).collect(),
            None,
        )
    }

    #[test]
    fn test_one_split_per_abi() {
        let splits = NativeLibrariesSplitter
            .split(module(&[
                "dex/classes.dex",
                "lib/arm64-v8a/libgame.so",
                "lib/arm64-v8a/libaudio.so",
                "lib/x86_64/libgame.so",
            ]))
            .unwrap();
        assert_eq!(splits.len(), 3);
        assert!(splits[0].is_master_split);
        assert_eq!(splits[0].entry_paths(), ["dex/classes.dex"].into_iter().collect());

        let arm = splits
            .iter()
            .find(|s| s.targeting.abi.values().contains(&Abi::Arm64V8a))
            .unwrap();
        assert_eq!(arm.entries.len(), 2);
        assert!(arm.targeting.abi.alternatives().contains(&Abi::X86_64));
        assert_eq!(arm.split_id(), "base.config.arm64_v8a");
    }

    #[test]
    fn test_rejects_unknown_abi() {
        let err = NativeLibrariesSplitter
            .split(module(&["lib/sparc/libgame.so"]))
            .unwrap_err();
        assert!(err.to_string().contains("sparc"));
    }

    #[test]
    fn test_without_libraries_passes_through() {
        let input = module(&["dex/classes.dex", "lib/README"]);
        assert_eq!(NativeLibrariesSplitter.split(input.clone()).unwrap(), vec![input]);
    }
}
