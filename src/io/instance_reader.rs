use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};

lazy_static! {
    static ref VALUE_SEPARATOR_PATTERN: Regex = Regex::new(r"[,\s]+").unwrap();
}

/// A reader for the instances to explain.
///
/// Each non-empty line holds an instance, given by its feature values separated by commas and/or spaces.
/// The text following a `#` is a comment.
///
/// # Example
///
/// ```
/// # use xplatree::io::InstanceReader;
/// let instances = InstanceReader::default()
///     .read(&mut "# two instances\n1, 0.5\n0 2.5\n".as_bytes())
///     .unwrap();
/// assert_eq!(vec![vec![1., 0.5], vec![0., 2.5]], instances);
/// ```
#[derive(Default)]
pub struct InstanceReader;

impl InstanceReader {
    /// Reads the instances.
    pub fn read(&self, reader: &mut dyn Read) -> Result<Vec<Vec<f64>>> {
        let br = BufReader::new(reader);
        let mut instances = vec![];
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let l = line.with_context(context)?;
            let content = l.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let instance = VALUE_SEPARATOR_PATTERN
                .split(content)
                .map(|w| match w.parse::<f64>() {
                    Ok(x) if x.is_finite() => Ok(x),
                    _ => Err(anyhow!("invalid feature value: {}", w)),
                })
                .collect::<Result<Vec<f64>>>()
                .with_context(context)?;
            instances.push(instance);
        }
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read() {
        let instances = InstanceReader::default()
            .read(&mut "1,2, 3\n\n  4 5\t6  # comment\n#\n".as_bytes())
            .unwrap();
        assert_eq!(vec![vec![1., 2., 3.], vec![4., 5., 6.]], instances);
    }

    #[test]
    fn test_empty() {
        assert!(InstanceReader::default()
            .read(&mut "# nothing\n".as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_value() {
        assert!(InstanceReader::default()
            .read(&mut "1 a\n".as_bytes())
            .is_err());
        assert!(InstanceReader::default()
            .read(&mut "1 NaN\n".as_bytes())
            .is_err());
        assert!(InstanceReader::default()
            .read(&mut "1,,2\n".as_bytes())
            .is_ok());
    }
}
