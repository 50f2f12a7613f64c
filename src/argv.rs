//! Minimist-style argument vector forwarded verbatim to plugins.
//!
//! Positional arguments collect under `_`; flags map to booleans, numbers or
//! strings. Repeated flags collect into arrays.

use serde_json::{Map, Number, Value};

const POSITIONAL_KEY: &str = "_";

/// Flags that never consume the following argument as their value.
const BOOLEAN_FLAGS: &[&str] = &["verbose", "help", "version", "h", "v"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentVector {
    positional: Vec<Value>,
    flags: Map<String, Value>,
}

impl ArgumentVector {
    /// Parses raw arguments, not including the program name.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut argv = ArgumentVector::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];

            if arg == "--" {
                argv.positional
                    .extend(args[i + 1..].iter().map(|a| coerce(a)));
                break;
            }

            if let Some(long) = arg.strip_prefix("--") {
                if let Some((key, value)) = long.split_once('=') {
                    argv.set(key, coerce(value));
                } else if let Some(key) = long.strip_prefix("no-") {
                    argv.set(key, Value::Bool(false));
                } else if let Some(next) = args
                    .get(i + 1)
                    .filter(|n| !is_flag(n) && !BOOLEAN_FLAGS.contains(&long))
                {
                    argv.set(long, coerce(next));
                    i += 1;
                } else {
                    argv.set(long, Value::Bool(true));
                }
            } else if is_flag(arg) {
                let letters: Vec<char> = arg[1..].chars().collect();
                let Some((last, rest)) = letters.split_last() else {
                    i += 1;
                    continue;
                };
                for letter in rest {
                    argv.set(&letter.to_string(), Value::Bool(true));
                }
                let last = last.to_string();
                if let Some(next) = args
                    .get(i + 1)
                    .filter(|n| !is_flag(n) && !BOOLEAN_FLAGS.contains(&last.as_str()))
                {
                    argv.set(&last, coerce(next));
                    i += 1;
                } else {
                    argv.set(&last, Value::Bool(true));
                }
            } else {
                argv.positional.push(coerce(arg));
            }

            i += 1;
        }

        argv
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// The first positional argument rendered as a string, if any.
    pub fn command(&self) -> Option<String> {
        self.positional.first().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Returns true when the flag is present and not `false`, `0` or empty.
    pub fn is_set(&self, key: &str) -> bool {
        match self.flags.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(_) => true,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.flags.get(key).and_then(Value::as_str)
    }

    pub fn is_verbose(&self) -> bool {
        self.is_set("verbose") || self.get_str("logLevel") == Some("verbose")
    }

    pub fn color_enabled(&self) -> bool {
        !matches!(self.flags.get("color"), Some(Value::Bool(false)))
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            POSITIONAL_KEY.to_string(),
            Value::Array(self.positional.clone()),
        );
        for (key, value) in &self.flags {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    fn set(&mut self, key: &str, value: Value) {
        match self.flags.get_mut(key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.flags.insert(key.to_string(), value);
            }
        }
    }
}

fn is_flag(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && arg.parse::<f64>().is_err()
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = raw.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
        && raw.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
