//Copyright 2026 Aspectra Developers
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use compact_str::CompactString;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A `token -> cluster id` table from an external word clustering
/// (Brown, Clark, word2vec, ...). Loaded once at induction time.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ClusterMap {
    map: HashMap<CompactString, u64>,
    skipped: u32,
}

impl ClusterMap {
    /// Loads space-separated `token clusterId` lines. The id is parsed as
    /// decimal, falling back to a binary bit string (Brown paths) on
    /// failure; lines that parse neither way are skipped and counted.
    pub fn load(path: &Utf8Path) -> Result<Self, std::io::Error> {
        let loaded = Self::load_from(BufReader::new(File::open(path)?));
        log::info!(
            "Loaded {} cluster assignments from {} ({} lines skipped).",
            loaded.map.len(),
            path,
            loaded.skipped
        );
        Ok(loaded)
    }

    pub fn load_from<R: Read>(reader: BufReader<R>) -> Self {
        let mut result = Self::default();
        for line in reader.lines().map_while(Result::ok) {
            let mut fields = line.split_whitespace();
            let (Some(token), Some(id)) = (fields.next(), fields.next()) else {
                if !line.trim().is_empty() {
                    result.skipped += 1;
                }
                continue;
            };
            match parse_cluster_id(id) {
                Some(id) => {
                    result.map.insert(CompactString::from(token), id);
                }
                None => result.skipped += 1,
            }
        }
        result
    }

    pub fn lookup(&self, token: &str) -> Option<u64> {
        self.map.get(token).copied()
    }

    /// Distinct cluster ids, sorted so slot creation is deterministic.
    pub fn distinct_ids(&self) -> Vec<u64> {
        self.map.values().copied().unique().sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn skipped(&self) -> u32 {
        self.skipped
    }
}

fn parse_cluster_id(id: &str) -> Option<u64> {
    id.parse::<u64>()
        .ok()
        .or_else(|| u64::from_str_radix(id, 2).ok())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::BufReader;

    fn load_str(data: &str) -> ClusterMap {
        ClusterMap::load_from(BufReader::new(data.as_bytes()))
    }

    #[test]
    fn parses_decimal_and_binary_ids() {
        let map = load_str("movie 42\nfilm 42\ngood 0110\n");
        assert_eq!(map.lookup("movie"), Some(42));
        assert_eq!(map.lookup("film"), Some(42));
        // "0110" is valid decimal, decimal parsing wins.
        assert_eq!(map.lookup("good"), Some(110));
        assert_eq!(map.lookup("unknown"), None);
        assert_eq!(map.distinct_ids(), vec![42, 110]);
    }

    #[test]
    fn binary_fallback() {
        assert_eq!(parse_cluster_id("1110"), Some(1110));
        assert_eq!(parse_cluster_id("111091"), Some(111091));
        // Only non-decimal bit strings take the binary path.
        assert_eq!(parse_cluster_id("x101"), None);
    }

    #[test]
    fn skips_malformed_lines() {
        let map = load_str("movie 3\nbroken\nfilm abc\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.skipped(), 2);
    }
}
