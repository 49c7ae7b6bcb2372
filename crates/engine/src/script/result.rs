use crate::verdict::ConditionResult;

/// First field of a two-field result that reports a script failure.
pub const ERROR_SENTINEL: &str = "ERROR";

/// Parses `eui;measurement;value[;target;command]`.
///
/// Fewer than three fields never signal a violation; two fields led by
/// [`ERROR_SENTINEL`] signal a failure. A result whose fields are all empty
/// (`;;`) is treated as not violated. Anything after the fourth `;` belongs
/// to the command.
pub fn parse_result(config_id: i64, eui: &str, raw: &str) -> ConditionResult {
    let fields: Vec<&str> = raw.split(';').collect();

    if fields.len() < 3 {
        return match fields.as_slice() {
            [ERROR_SENTINEL, message] => ConditionResult::failed(config_id, eui, *message),
            _ => ConditionResult::not_violated(config_id, eui),
        };
    }
    if fields.iter().all(|f| f.trim().is_empty()) {
        return ConditionResult::not_violated(config_id, eui);
    }

    let value = match fields[2].trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            return ConditionResult::failed(
                config_id,
                eui,
                format!("invalid value {:?} in script result", fields[2]),
            )
        }
    };

    let reported_eui = match fields[0].trim() {
        "" => eui,
        e => e,
    };
    let mut result = ConditionResult::not_violated(config_id, reported_eui);
    result.violated = true;
    result.measurement = Some(fields[1].trim().to_string());
    result.value = Some(value);

    if fields.len() >= 5 {
        let target = fields[3].trim();
        let command = fields[4..].join(";");
        if !target.is_empty() {
            result.command_target = Some(target.to_string());
        }
        if !command.is_empty() {
            result.command = Some(command);
        }
    }
    result
}
