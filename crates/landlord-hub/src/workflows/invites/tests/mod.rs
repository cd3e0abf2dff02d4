mod common;
mod redemption;
mod routing;
