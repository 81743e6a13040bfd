//! Replays a trace against an LFUDA cache

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use agecache::{Admission, Config, LfudaCache};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::trace::Op;

/// Summary of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub operations: u64,
    pub capacity: usize,
    pub len: usize,
    pub threshold: i64,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
    pub inserts: u64,
    pub updates: u64,
    pub evictions: u64,
    pub rejections: u64,
    pub drifts: u64,
}

/// Drives a cache from trace operations
pub struct Replayer {
    cache: LfudaCache<String, String>,
    operations: u64,
}

impl Replayer {
    pub fn new(config: Config) -> Result<Self> {
        let cache = LfudaCache::with_config(config)?;
        Ok(Self {
            cache,
            operations: 0,
        })
    }

    /// Apply a single operation
    pub fn apply(&mut self, op: Op) -> Result<()> {
        self.operations += 1;

        match op {
            Op::Get(key) => {
                self.cache.get(&key);
            }
            Op::Set(key, value) => {
                if let Admission::Evicted(victim, _) = self.cache.set(key, value) {
                    debug!("evicted {}", victim);
                }
            }
            Op::Del(key) => {
                if self.cache.delete(&key).is_err() {
                    debug!("del on missing key {}", key);
                }
            }
            Op::Drift(amount) => self.cache.drift(amount)?,
            Op::Clear => self.cache.clear(),
            Op::Access(key) => {
                if self.cache.get(&key).is_none() {
                    let value = key.clone();
                    let _ = self.cache.set(key, value);
                }
            }
        }
        Ok(())
    }

    /// Apply every operation read from `reader`
    pub fn replay<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (number, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read trace line {}", number + 1))?;
            let op = Op::parse(&line).map_err(|e| anyhow!("line {}: {}", number + 1, e))?;
            if let Some(op) = op {
                self.apply(op)
                    .with_context(|| format!("line {}", number + 1))?;
            }
        }

        info!(
            "Replayed {} operations, {} entries cached",
            self.operations,
            self.cache.len()
        );
        Ok(())
    }

    /// Replay a trace file
    pub fn replay_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .with_context(|| format!("failed to open trace {}", path.display()))?;
        self.replay(BufReader::new(file))
    }

    pub fn cache(&self) -> &LfudaCache<String, String> {
        &self.cache
    }

    pub fn report(&self) -> Report {
        let stats = self.cache.stats();
        Report {
            operations: self.operations,
            capacity: self.cache.capacity(),
            len: self.cache.len(),
            threshold: self.cache.threshold(),
            hits: stats.hits(),
            misses: stats.misses(),
            hit_ratio: stats.hit_ratio(),
            inserts: stats.inserts(),
            updates: stats.updates(),
            evictions: stats.evictions(),
            rejections: stats.rejections(),
            drifts: stats.drifts(),
        }
    }
}
