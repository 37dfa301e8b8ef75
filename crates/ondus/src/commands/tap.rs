//! `ondus tap`: dispense water from a Blue Home tap.

use ondus_api::{Session, WaterType};

use crate::cli::{GlobalOpts, TapArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, args: TapArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let appliance = session
        .appliance(&args.appliance)
        .await
        .ok_or_else(|| CliError::NotFound {
            resource_type: "Appliance".into(),
            identifier: args.appliance.clone(),
        })?;

    let tap = appliance.as_blue_home().ok_or_else(|| CliError::Validation {
        field: "appliance".into(),
        reason: format!(
            "'{}' is a {} appliance, not a BLUE_HOME tap",
            args.appliance,
            appliance.appliance_type()
        ),
    })?;

    let water = WaterType::from(args.water);
    tracing::info!(appliance = %args.appliance, %water, amount_ml = args.amount, "dispensing");
    let response = tap.open_water(water, args.amount).await;

    let out = output::render_value(&global.output, &response)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
