//! Access trace parsing
//!
//! One operation per line:
//! - `get KEY`, `set KEY VALUE`, `del KEY`
//! - `drift AMOUNT`, `clear`
//! - a bare `KEY`: memoized access (get, then set on a miss)
//!
//! Blank lines and lines starting with `#` are skipped.

/// A single trace operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Plain lookup
    Get(String),
    /// Store a value
    Set(String, String),
    /// Remove a key
    Del(String),
    /// Age every counter by the given positive amount
    Drift(i64),
    /// Empty the cache
    Clear,
    /// Lookup that fills the cache on a miss
    Access(String),
}

impl Op {
    /// Parse one trace line. `Ok(None)` for blank and comment lines.
    pub fn parse(line: &str) -> Result<Option<Op>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts[0].to_uppercase();
        let args = &parts[1..];

        let op = match command.as_str() {
            "GET" => Op::Get(single_arg("get", args)?),
            "DEL" => Op::Del(single_arg("del", args)?),
            "SET" => {
                if args.len() < 2 {
                    return Err("wrong number of arguments for 'set'".to_string());
                }
                Op::Set(args[0].to_string(), args[1..].join(" "))
            }
            "DRIFT" => {
                let amount = single_arg("drift", args)?;
                match amount.parse::<i64>() {
                    Ok(value) if value > 0 => Op::Drift(value),
                    _ => return Err(format!("invalid drift amount '{}'", amount)),
                }
            }
            "CLEAR" => {
                if !args.is_empty() {
                    return Err("'clear' takes no arguments".to_string());
                }
                Op::Clear
            }
            _ if args.is_empty() => Op::Access(parts[0].to_string()),
            _ => return Err(format!("unknown command '{}'", parts[0])),
        };

        Ok(Some(op))
    }
}

fn single_arg(command: &str, args: &[&str]) -> Result<String, String> {
    match args {
        [arg] => Ok(arg.to_string()),
        _ => Err(format!("wrong number of arguments for '{}'", command)),
    }
}
