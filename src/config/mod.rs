pub mod settings;

pub use settings::{
    ApiToken, Environment, EodhdSettings, LakeSettings, OandaSettings, Settings,
    YahooFinanceSettings,
};
