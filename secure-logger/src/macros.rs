// Logging macros routed through the process-wide dispatcher
#[macro_export]
macro_rules! secure_debug {
    ($message:expr) => {
        $crate::global().debug($message, None)
    };
    ($message:expr, $data:expr) => {
        $crate::global().debug($message, Some($data))
    };
}

#[macro_export]
macro_rules! secure_info {
    ($message:expr) => {
        $crate::global().info($message, None)
    };
    ($message:expr, $data:expr) => {
        $crate::global().info($message, Some($data))
    };
}

#[macro_export]
macro_rules! secure_warn {
    ($message:expr) => {
        $crate::global().warn($message, None)
    };
    ($message:expr, $data:expr) => {
        $crate::global().warn($message, Some($data))
    };
}

#[macro_export]
macro_rules! secure_error {
    ($message:expr) => {
        $crate::global().error($message, None)
    };
    ($message:expr, $data:expr) => {
        $crate::global().error($message, Some($data))
    };
}

#[macro_export]
macro_rules! secure_security {
    ($message:expr) => {
        $crate::global().security($message, None)
    };
    ($message:expr, $data:expr) => {
        $crate::global().security($message, Some($data))
    };
}
