//! 运行环境相关的小工具：panic 钩子与浏览器控制台日志。

/// 输出到浏览器控制台（`console.log`）。非 wasm 目标上只格式化、不输出。
macro_rules! console_log {
    ($($t:tt)*) => {{
        let message = ::std::format!($($t)*);
        $crate::utils::log_line(&message);
    }};
}

/// 输出警告到浏览器控制台（`console.warn`）。
macro_rules! console_warn {
    ($($t:tt)*) => {{
        let message = ::std::format!($($t)*);
        $crate::utils::warn_line(&message);
    }};
}

#[cfg(target_arch = "wasm32")]
pub fn log_line(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log_line(_message: &str) {}

#[cfg(target_arch = "wasm32")]
pub fn warn_line(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn_line(_message: &str) {}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}
