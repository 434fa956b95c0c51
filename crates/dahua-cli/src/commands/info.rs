//! `dahua info`: identity, capabilities and derived state after one tick.

use serde::Serialize;

use dahua_api::{DahuaClient, StreamSubtype};
use dahua_core::{Capabilities, Coordinator, DeviceClass, ProfileMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct DeviceInfo {
    name: String,
    model: String,
    serial_number: String,
    firmware_version: Option<String>,
    class: DeviceClass,
    profile_mode: ProfileMode,
    capabilities: Capabilities,
    features: Features,
    state: DerivedState,
    rtsp: Rtsp,
    events: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Features {
    siren: bool,
    security_light: bool,
    infrared_light: bool,
    illuminator: bool,
}

#[derive(Debug, Serialize)]
struct DerivedState {
    motion_detection: bool,
    disarming_linkage: bool,
    siren_on: bool,
    security_light_on: bool,
    infrared_light_on: bool,
    /// 0..=255
    infrared_brightness: u8,
    illuminator_on: bool,
    /// 0..=255
    illuminator_brightness: u8,
}

#[derive(Debug, Serialize)]
struct Rtsp {
    main: String,
    sub: String,
}

pub async fn handle(
    coordinator: &Coordinator<DahuaClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.refresh().await?;
    let info = collect(coordinator);

    let out = output::render_single(&global.output, &info, detail, |i| i.model.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn collect(c: &Coordinator<DahuaClient>) -> DeviceInfo {
    let profile = c.profile();
    let channel = 1;
    DeviceInfo {
        name: c.device_name(),
        model: c.model(),
        serial_number: c.serial_number(),
        firmware_version: c.firmware_version(),
        class: profile.class(),
        profile_mode: profile.profile_mode,
        capabilities: profile.capabilities,
        features: Features {
            siren: c.supports_siren(),
            security_light: c.supports_security_light(),
            infrared_light: c.supports_infrared_light(),
            illuminator: c.supports_illuminator(),
        },
        state: DerivedState {
            motion_detection: c.is_motion_detection_enabled(),
            disarming_linkage: c.is_disarming_linkage_enabled(),
            siren_on: c.is_siren_on(),
            security_light_on: c.is_security_light_on(),
            infrared_light_on: c.is_infrared_light_on(),
            infrared_brightness: c.infrared_brightness(),
            illuminator_on: c.is_illuminator_on(),
            illuminator_brightness: c.illuminator_brightness(),
        },
        rtsp: Rtsp {
            main: c.api().rtsp_url(channel, StreamSubtype::Main),
            sub: c.api().rtsp_url(channel, StreamSubtype::Sub),
        },
        events: c.event_list().to_vec(),
    }
}

fn on_off(value: bool) -> String {
    if value { "on" } else { "off" }.into()
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.into()
}

fn detail(i: &DeviceInfo) -> String {
    let mut rows = vec![
        ("Name", i.name.clone()),
        ("Model", i.model.clone()),
        ("Serial", i.serial_number.clone()),
        (
            "Firmware",
            i.firmware_version.clone().unwrap_or_else(|| "-".into()),
        ),
        ("Class", i.class.to_string()),
        ("Profile mode", format!("{:?}", i.profile_mode)),
        ("Coaxial control", i.capabilities.coaxial_control.to_string()),
        ("Disarming linkage", i.capabilities.disarming_linkage.to_string()),
        ("Motion detection", on_off(i.state.motion_detection)),
    ];

    if i.capabilities.disarming_linkage.is_supported() {
        rows.push(("Linkage enabled", yes_no(i.state.disarming_linkage)));
    }
    if i.features.siren {
        rows.push(("Siren", on_off(i.state.siren_on)));
    }
    if i.features.security_light {
        rows.push(("Security light", on_off(i.state.security_light_on)));
    }
    if i.features.infrared_light {
        rows.push((
            "Infrared",
            format!(
                "{} ({}/255)",
                on_off(i.state.infrared_light_on),
                i.state.infrared_brightness
            ),
        ));
    }
    if i.features.illuminator {
        rows.push((
            "Illuminator",
            format!(
                "{} ({}/255)",
                on_off(i.state.illuminator_on),
                i.state.illuminator_brightness
            ),
        ));
    }
    rows.push(("RTSP main", i.rtsp.main.clone()));
    rows.push(("RTSP sub", i.rtsp.sub.clone()));
    rows.push(("Events", i.events.join(", ")));

    output::detail_block(&rows)
}
