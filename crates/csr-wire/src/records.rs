use csr_model::{CoreUsage, Detected, HistoryRow, Risk, ScanContext, Severity, UrlContext, UrlVerdict, UserResponse};

use crate::codec::{Decoder, Encoder};
use crate::error::WireError;

fn encode_severity(enc: &mut Encoder, s: Severity) {
    enc.i32(match s {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
    });
}

fn decode_severity(dec: &mut Decoder<'_>) -> Result<Severity, WireError> {
    match dec.i32()? {
        0 => Ok(Severity::Low),
        1 => Ok(Severity::Medium),
        2 => Ok(Severity::High),
        other => Err(WireError::protocol(format!("invalid severity discriminant {other}"))),
    }
}

fn encode_risk(enc: &mut Encoder, r: Risk) {
    enc.i32(match r {
        Risk::Unverified => 0,
        Risk::Low => 1,
        Risk::Medium => 2,
        Risk::High => 3,
    });
}

fn decode_risk(dec: &mut Decoder<'_>) -> Result<Risk, WireError> {
    match dec.i32()? {
        0 => Ok(Risk::Unverified),
        1 => Ok(Risk::Low),
        2 => Ok(Risk::Medium),
        3 => Ok(Risk::High),
        other => Err(WireError::protocol(format!("invalid risk discriminant {other}"))),
    }
}

fn encode_user_response(enc: &mut Encoder, r: UserResponse) {
    enc.i32(match r {
        UserResponse::NotAsked => 0,
        UserResponse::Remove => 1,
        UserResponse::ProcessingAllowed => 2,
        UserResponse::ProcessingDisallowed => 3,
    });
}

fn decode_user_response(dec: &mut Decoder<'_>) -> Result<UserResponse, WireError> {
    match dec.i32()? {
        0 => Ok(UserResponse::NotAsked),
        1 => Ok(UserResponse::Remove),
        2 => Ok(UserResponse::ProcessingAllowed),
        3 => Ok(UserResponse::ProcessingDisallowed),
        other => Err(WireError::protocol(format!("invalid user_response discriminant {other}"))),
    }
}

fn encode_core_usage(enc: &mut Encoder, c: CoreUsage) {
    enc.i32(match c {
        CoreUsage::Default => 0,
        CoreUsage::All => 1,
        CoreUsage::Half => 2,
        CoreUsage::Single => 3,
    });
}

fn decode_core_usage(dec: &mut Decoder<'_>) -> Result<CoreUsage, WireError> {
    match dec.i32()? {
        0 => Ok(CoreUsage::Default),
        1 => Ok(CoreUsage::All),
        2 => Ok(CoreUsage::Half),
        3 => Ok(CoreUsage::Single),
        other => Err(WireError::protocol(format!("invalid core_usage discriminant {other}"))),
    }
}

pub fn encode_detected(enc: &mut Encoder, d: &Detected) {
    enc.string(&d.target_name);
    enc.string(&d.malware_name);
    enc.string(&d.detailed_url);
    encode_severity(enc, d.severity);
    enc.i64(d.ts);
    enc.bool(d.is_app);
    enc.string(&d.pkg_id);
    encode_user_response(enc, d.user_response);
}

pub fn decode_detected(dec: &mut Decoder<'_>) -> Result<Detected, WireError> {
    Ok(Detected {
        target_name: dec.string()?,
        malware_name: dec.string()?,
        detailed_url: dec.string()?,
        severity: decode_severity(dec)?,
        ts: dec.i64()?,
        is_app: dec.bool()?,
        pkg_id: dec.string()?,
        user_response: decode_user_response(dec)?,
    })
}

pub fn encode_history_row(enc: &mut Encoder, row: &HistoryRow) {
    encode_detected(enc, &row.detected);
    enc.string(&row.file_in_app_path);
    enc.bool(row.is_ignored);
    enc.string(&row.data_version);
    enc.bool(row.by_cloud);
}

pub fn decode_history_row(dec: &mut Decoder<'_>) -> Result<HistoryRow, WireError> {
    Ok(HistoryRow {
        detected: decode_detected(dec)?,
        file_in_app_path: dec.string()?,
        is_ignored: dec.bool()?,
        data_version: dec.string()?,
        by_cloud: dec.bool()?,
    })
}

pub fn encode_scan_context(enc: &mut Encoder, ctx: &ScanContext) {
    enc.bool(ctx.ask_user);
    enc.string(&ctx.popup_message);
    encode_core_usage(enc, ctx.core_usage);
    enc.bool(ctx.scan_on_cloud);
    enc.bool(ctx.is_scanned_cb_registered);
}

pub fn decode_scan_context(dec: &mut Decoder<'_>) -> Result<ScanContext, WireError> {
    let ask_user = dec.bool()?;
    let popup_message = dec.string()?;
    let core_usage = decode_core_usage(dec)?;
    let scan_on_cloud = dec.bool()?;
    let is_scanned_cb_registered = dec.bool()?;
    Ok(ScanContext::new(ask_user, popup_message)
        .with_core_usage(core_usage)
        .with_scan_on_cloud(scan_on_cloud)
        .with_scanned_cb_registered(is_scanned_cb_registered))
}

pub fn encode_url_context(enc: &mut Encoder, ctx: &UrlContext) {
    enc.bool(ctx.ask_user);
    enc.string(&ctx.popup_message);
}

pub fn decode_url_context(dec: &mut Decoder<'_>) -> Result<UrlContext, WireError> {
    Ok(UrlContext {
        ask_user: dec.bool()?,
        popup_message: dec.string()?,
    })
}

pub fn encode_url_verdict(enc: &mut Encoder, v: &UrlVerdict) {
    encode_risk(enc, v.risk);
    enc.string(&v.detailed_url);
    encode_user_response(enc, v.user_response);
}

pub fn decode_url_verdict(dec: &mut Decoder<'_>) -> Result<UrlVerdict, WireError> {
    Ok(UrlVerdict {
        risk: decode_risk(dec)?,
        detailed_url: dec.string()?,
        user_response: decode_user_response(dec)?,
    })
}
