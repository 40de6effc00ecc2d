//! The textual sample format (§4.9/§6): a first line `<n_samples> <n_symbols>` followed
//! by one trace per line, `<label 0|1> <event_count> <symbol_id>:<time> …`. Symbol ids
//! are small non-negative integers rather than names; this loader treats the id's
//! decimal string as the [`drta_core::symbol::Symbol`] itself, so `0:1.5 1:2.0` and a
//! trace built from `Symbol::new("0")`/`Symbol::new("1")` round-trip identically.

use drta_core::error::LearnerError;
use drta_core::trace::{Event, Label, Sample, TimedTrace};

fn parse_event(token: &str, line_no: usize) -> Result<Event, LearnerError> {
    let (symbol_id, time_str) = token.split_once(':').ok_or_else(|| LearnerError::MalformedInput {
        token: format!("line {line_no}: {token:?}"),
        reason: "expected <symbol_id>:<time>".to_string(),
    })?;
    symbol_id.parse::<u32>().map_err(|_| LearnerError::MalformedInput {
        token: symbol_id.to_string(),
        reason: "symbol id must be a non-negative integer".to_string(),
    })?;
    let time: f64 = time_str.parse().map_err(|_| LearnerError::MalformedInput {
        token: time_str.to_string(),
        reason: "timestamp must be numeric".to_string(),
    })?;
    if time < 0.0 {
        return Err(LearnerError::MalformedInput {
            token: time_str.to_string(),
            reason: "timestamp must be non-negative".to_string(),
        });
    }
    Ok(Event {
        symbol: symbol_id.into(),
        time,
    })
}

fn parse_line(line: &str, line_no: usize) -> Result<(TimedTrace, Label), LearnerError> {
    let mut tokens = line.split_whitespace();
    let label_tok = tokens.next().ok_or_else(|| LearnerError::MalformedInput {
        token: format!("line {line_no}"),
        reason: "missing label".to_string(),
    })?;
    let label = match label_tok {
        "1" => Label::Accept,
        "0" => Label::Reject,
        other => {
            return Err(LearnerError::MalformedInput {
                token: other.to_string(),
                reason: "label must be 0 or 1".to_string(),
            })
        }
    };

    let count_tok = tokens.next().ok_or_else(|| LearnerError::MalformedInput {
        token: format!("line {line_no}"),
        reason: "missing event count".to_string(),
    })?;
    let count: usize = count_tok.parse().map_err(|_| LearnerError::MalformedInput {
        token: count_tok.to_string(),
        reason: "event count must be an integer".to_string(),
    })?;

    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        let token = tokens.next().ok_or_else(|| LearnerError::MalformedInput {
            token: format!("line {line_no}"),
            reason: "missing symbol_id:time token".to_string(),
        })?;
        events.push(parse_event(token, line_no)?);
    }

    Ok((TimedTrace::new(events), label))
}

/// Parses the textual sample format. Lines with fewer than three whitespace-separated
/// tokens are skipped, per §4.9.
pub fn parse_sample(text: &str) -> Result<Sample, LearnerError> {
    let mut lines = text.lines().filter(|l| l.split_whitespace().count() >= 2);
    let header = lines.next().ok_or_else(|| LearnerError::MalformedInput {
        token: "<empty input>".to_string(),
        reason: "missing header line".to_string(),
    })?;
    let declared_count: usize = header
        .split_whitespace()
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| LearnerError::MalformedInput {
            token: header.to_string(),
            reason: "header must start with the sample count".to_string(),
        })?;

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (i, line) in lines.enumerate() {
        let (trace, label) = parse_line(line, i + 2)?;
        match label {
            Label::Accept => positive.push(trace),
            Label::Reject => negative.push(trace),
        }
    }

    let actual = positive.len() + negative.len();
    if actual != declared_count {
        return Err(LearnerError::MalformedInput {
            token: header.to_string(),
            reason: format!("header declares {declared_count} samples but {actual} were read"),
        });
    }

    Ok(Sample::new(positive, negative))
}

/// Serialises `sample` back into the textual format, e.g. for the `generate` subcommand.
pub fn format_sample(sample: &Sample) -> String {
    let symbol_count = sample.symbols().len();
    let mut out = format!(
        "{} {}\n",
        sample.positive.len() + sample.negative.len(),
        symbol_count
    );
    for (trace, label) in sample.labelled_traces() {
        out.push_str(if label.is_accept() { "1" } else { "0" });
        out.push(' ');
        out.push_str(&trace.len().to_string());
        for event in &trace.0 {
            out.push(' ');
            out.push_str(event.symbol.as_str());
            out.push(':');
            out.push_str(&event.time.to_string());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_traces() {
        let text = "2 1\n1 1 0:1.0\n0 1 0:3.0\n";
        let sample = parse_sample(text).unwrap();
        assert_eq!(sample.positive.len(), 1);
        assert_eq!(sample.negative.len(), 1);
        assert_eq!(sample.positive[0].0[0].time, 1.0);
    }

    #[test]
    fn rejects_mismatched_header_count() {
        let text = "5 1\n1 1 0:1.0\n";
        assert!(parse_sample(text).is_err());
    }

    #[test]
    fn rejects_bad_label() {
        let text = "1 1\n2 1 0:1.0\n";
        assert!(parse_sample(text).is_err());
    }

    #[test]
    fn rejects_malformed_event_token() {
        let text = "1 1\n1 1 notanevent\n";
        assert!(parse_sample(text).is_err());
    }

    #[test]
    fn roundtrips_through_format_sample() {
        let text = "2 1\n1 1 0:1.5\n0 2 0:2.0 0:3.0\n";
        let sample = parse_sample(text).unwrap();
        let formatted = format_sample(&sample);
        let reparsed = parse_sample(&formatted).unwrap();
        assert_eq!(sample.positive.len(), reparsed.positive.len());
        assert_eq!(sample.negative.len(), reparsed.negative.len());
    }
}
