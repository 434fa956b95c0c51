//! Device commands: motion detection and infrared light.

use dahua_api::{DahuaClient, InfraredMode};
use dahua_core::{Command as CoreCommand, Coordinator};

use crate::cli::{GlobalOpts, InfraredArgs, InfraredModeArg, MotionArgs, Toggle};
use crate::error::CliError;

pub async fn motion(
    coordinator: &Coordinator<DahuaClient>,
    args: MotionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let enabled = matches!(args.state, Toggle::On);
    coordinator
        .execute(CoreCommand::SetMotionDetection { enabled })
        .await?;

    if !global.quiet {
        let state = if coordinator.is_motion_detection_enabled() {
            "enabled"
        } else {
            "disabled"
        };
        eprintln!("Motion detection {state}");
    }
    Ok(())
}

pub async fn infrared(
    coordinator: &Coordinator<DahuaClient>,
    args: InfraredArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mode = match args.mode {
        InfraredModeArg::On => InfraredMode::On,
        InfraredModeArg::Off => InfraredMode::Off,
        InfraredModeArg::Auto => InfraredMode::Auto,
    };

    // The model must be known before the infrared check can pass.
    coordinator.refresh().await?;
    coordinator
        .execute(CoreCommand::SetInfraredMode {
            mode,
            brightness: args.brightness,
        })
        .await?;

    if !global.quiet {
        eprintln!(
            "Infrared set to {mode} (now {}, brightness {}/255)",
            if coordinator.is_infrared_light_on() { "on" } else { "off" },
            coordinator.infrared_brightness()
        );
    }
    Ok(())
}
