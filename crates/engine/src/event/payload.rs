use sentinel_common::{EventType, MeasurementSnapshot};

/// Number of positional fields between the EUI and the first `name=value`
/// pair in a full DATA payload.
const DATA_HEADER_FIELDS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PayloadError {
    #[error("command payload needs `deviceEui;json`, got {0:?}")]
    MalformedCommand(String),
    #[error("data payload has {0} fields, expected 1 or at least {min}", min = DATA_HEADER_FIELDS + 1)]
    TruncatedData(usize),
    #[error("event for {0:?} carries no device EUI")]
    MissingEui(EventType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `snapshot` is `None` when values must be read from the store.
    Data {
        eui: String,
        snapshot: Option<MeasurementSnapshot>,
    },
    Command {
        eui: String,
        payload: String,
    },
    Device {
        eui: String,
        payload: String,
    },
}

impl Event {
    pub fn parse(event_type: EventType, eui: &str, payload: Option<&str>) -> Result<Self, PayloadError> {
        let payload = payload.map(str::trim).filter(|p| !p.is_empty());
        let event = match event_type {
            EventType::Data => parse_data(eui, payload)?,
            EventType::Command => parse_command(payload.unwrap_or(eui))?,
            EventType::Device => Event::Device {
                eui: eui.trim().to_string(),
                payload: payload.unwrap_or_default().to_string(),
            },
        };
        if event.eui().is_empty() {
            return Err(PayloadError::MissingEui(event_type));
        }
        Ok(event)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::Data { .. } => EventType::Data,
            Self::Command { .. } => EventType::Command,
            Self::Device { .. } => EventType::Device,
        }
    }

    pub fn eui(&self) -> &str {
        match self {
            Self::Data { eui, .. } | Self::Command { eui, .. } | Self::Device { eui, .. } => eui,
        }
    }
}

/// `deviceEui;jsonPayload`, optionally prefixed with `&` or `#`. Everything
/// after the first `;` is the JSON part.
fn parse_command(raw: &str) -> Result<Event, PayloadError> {
    let body = raw.trim_start_matches(['&', '#']);
    match body.split_once(';') {
        Some((eui, json)) => Ok(Event::Command {
            eui: eui.trim().to_string(),
            payload: json.to_string(),
        }),
        None => Err(PayloadError::MalformedCommand(raw.to_string())),
    }
}

fn parse_data(eui: &str, payload: Option<&str>) -> Result<Event, PayloadError> {
    let Some(payload) = payload else {
        return Ok(Event::Data {
            eui: eui.trim().to_string(),
            snapshot: None,
        });
    };

    let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
    let eui = match fields[0] {
        "" => eui.trim(),
        first => first,
    };

    match fields.len() {
        1 => Ok(Event::Data {
            eui: eui.to_string(),
            snapshot: None,
        }),
        n if n <= DATA_HEADER_FIELDS => Err(PayloadError::TruncatedData(n)),
        _ => {
            let mut snapshot = MeasurementSnapshot::new(eui);
            snapshot.timestamp_ms = fields[1].parse().ok();
            for pair in &fields[DATA_HEADER_FIELDS + 1..] {
                let Some((name, value)) = pair.split_once('=') else {
                    tracing::debug!(eui, pair, "data field without `=`, skipped");
                    continue;
                };
                match value.trim().parse::<f64>() {
                    Ok(v) => snapshot.insert(name.trim(), v, None),
                    Err(_) => tracing::debug!(eui, pair, "non-numeric data field, skipped"),
                }
            }
            Ok(Event::Data {
                eui: eui.to_string(),
                snapshot: Some(snapshot),
            })
        }
    }
}
