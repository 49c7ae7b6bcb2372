use wasmtime::{Caller, Linker, Memory};

use super::error::ScriptError;
use super::host_state::HostState;
use super::result::ERROR_SENTINEL;

const NS: &str = "sentinel";

fn memory(caller: &mut Caller<'_, HostState>) -> wasmtime::Result<Memory> {
    caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or_else(|| wasmtime::Error::msg("script does not export `memory`"))
}

fn extract_string(caller: &mut Caller<'_, HostState>, ptr: i32, len: i32) -> wasmtime::Result<String> {
    let memory = memory(caller)?;
    let data = memory.data(&caller);
    let start = ptr as u32 as usize;
    let end = start
        .checked_add(len as u32 as usize)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| wasmtime::Error::msg("string out of bounds"))?;
    Ok(std::str::from_utf8(&data[start..end])?.to_string())
}

fn lookup(caller: &mut Caller<'_, HostState>, ptr: i32, len: i32, delta: bool) -> wasmtime::Result<f64> {
    let name = extract_string(caller, ptr, len)?;
    let found = caller.data().values.get(&name).and_then(|m| {
        if delta {
            m.delta
        } else {
            Some(m.value)
        }
    });
    Ok(found.unwrap_or(f64::NAN))
}

pub fn register_host_fns(linker: &mut Linker<HostState>) -> Result<(), ScriptError> {
    wrap(linker.func_wrap(NS, "get_value", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
        lookup(&mut caller, ptr, len, false)
    }))?;

    wrap(linker.func_wrap(NS, "get_delta", |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| {
        lookup(&mut caller, ptr, len, true)
    }))?;

    // Copies at most `cap` bytes; the return value is the full length so the
    // guest can retry with a larger buffer.
    wrap(linker.func_wrap(
        NS,
        "context",
        |mut caller: Caller<'_, HostState>, ptr: i32, cap: i32| -> wasmtime::Result<i32> {
            let memory = memory(&mut caller)?;
            let (data, state) = memory.data_and_store_mut(&mut caller);
            let json = &state.context_json;
            let start = ptr as u32 as usize;
            let n = json.len().min(cap.max(0) as usize);
            let dest = data
                .get_mut(start..start + n)
                .ok_or_else(|| wasmtime::Error::msg("context buffer out of bounds"))?;
            dest.copy_from_slice(&json[..n]);
            Ok(json.len() as i32)
        },
    ))?;

    wrap(linker.func_wrap(
        NS,
        "conditions_met",
        |mut caller: Caller<'_, HostState>, mptr: i32, mlen: i32, value: f64| -> wasmtime::Result<()> {
            let measurement = extract_string(&mut caller, mptr, mlen)?;
            let state = caller.data_mut();
            state.result = Some(format!("{};{};{}", state.eui, measurement, value));
            Ok(())
        },
    ))?;

    wrap(linker.func_wrap(NS, "conditions_not_met", |mut caller: Caller<'_, HostState>| {
        caller.data_mut().result = Some(String::new());
    }))?;

    wrap(linker.func_wrap(
        NS,
        "conditions_met_with_command",
        |mut caller: Caller<'_, HostState>,
         mptr: i32,
         mlen: i32,
         value: f64,
         tptr: i32,
         tlen: i32,
         cptr: i32,
         clen: i32|
         -> wasmtime::Result<()> {
            let measurement = extract_string(&mut caller, mptr, mlen)?;
            let target = extract_string(&mut caller, tptr, tlen)?;
            let command = extract_string(&mut caller, cptr, clen)?;
            let state = caller.data_mut();
            state.result = Some(format!(
                "{};{};{};{};{}",
                state.eui, measurement, value, target, command
            ));
            Ok(())
        },
    ))?;

    wrap(linker.func_wrap(
        NS,
        "fail",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let message = extract_string(&mut caller, ptr, len)?.replace(';', ",");
            caller.data_mut().result = Some(format!("{ERROR_SENTINEL};{message}"));
            Ok(())
        },
    ))?;

    wrap(linker.func_wrap(
        NS,
        "set_result",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let raw = extract_string(&mut caller, ptr, len)?;
            caller.data_mut().result = Some(raw);
            Ok(())
        },
    ))?;

    wrap(linker.func_wrap(
        NS,
        "log",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let line = extract_string(&mut caller, ptr, len)?;
            caller.data_mut().logs.push(line);
            Ok(())
        },
    ))?;

    Ok(())
}

fn wrap<T>(r: wasmtime::Result<T>) -> Result<(), ScriptError> {
    r.map(|_| ()).map_err(|e| ScriptError::Instantiation(e.to_string()))
}
