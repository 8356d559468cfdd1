use chrono::Local;
use uuid::Uuid;

/// 生成格式: state-{YYYYMMDDHHmmss}-{random8}
pub fn generate_state_id() -> String {
    let ts = Local::now().format("%Y%m%d%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    let suffix = &uuid[..8];
    format!("state-{}-{}", ts, suffix)
}
