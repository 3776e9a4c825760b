use once_cell::sync::Lazy;
use std::collections::HashMap;

pub static REGION_ENDPOINTS: Lazy<HashMap<&str, &str>> = Lazy::new(|| {
    HashMap::from([
        ("europe", "https://openapi.tuyaeu.com"),
        ("america", "https://openapi.tuyaus.com"),
        ("china", "https://openapi.tuyacn.com"),
        ("india", "https://openapi.tuyain.com"),
    ])
});
