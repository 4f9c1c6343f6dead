/// Standardized logging macros for consistent field names and message patterns across the service
///
/// These macros ensure:
/// - Consistent field naming conventions (`operation`, `student_id`, `component`)
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, student_id = $student_id:expr) => {
        tracing::debug!(
            operation = $operation,
            student_id = %$student_id,
            "API operation started"
        );
    };
    ($operation:expr, flashcard_id = $flashcard_id:expr) => {
        tracing::debug!(
            operation = $operation,
            flashcard_id = %$flashcard_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(operation = $operation, "API operation started");
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, student_id = $student_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            student_id = %$student_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, flashcard_id = $flashcard_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            flashcard_id = %$flashcard_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::debug!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(operation = $operation, "API operation completed: {}", $msg);
    };
}

/// Log API operation errors with consistent structure
#[macro_export]
macro_rules! log_api_error {
    ($operation:expr, student_id = $student_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            student_id = %$student_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, student_id = $student_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            student_id = %$student_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(operation = $operation, "API operation warning: {}", $msg);
    };
}

// ============================================================================
// Service Layer Logging Macros
// ============================================================================

/// Log service operation success
#[macro_export]
macro_rules! log_service_success {
    ($service:expr, $operation:expr, student_id = $student_id:expr, $msg:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            student_id = %$student_id,
            "Service operation completed: {}", $msg
        );
    };
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            "Service operation completed: {}", $msg
        );
    };
}

/// Log service warnings
#[macro_export]
macro_rules! log_service_warn {
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::warn!(
            service = $service,
            operation = $operation,
            "Service warning: {}",
            $msg
        );
    };
}

// ============================================================================
// Database Operation Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_db_operation {
    (info, $operation:expr, $msg:expr) => {
        tracing::info!(
            component = "database",
            operation = $operation,
            "Database operation: {}", $msg
        );
    };
    (error, $operation:expr, error = $error:expr) => {
        tracing::error!(
            component = "database",
            operation = $operation,
            error = %$error,
            "Database operation failed"
        );
    };
}

// ============================================================================
// External Service Logging Macros
// ============================================================================

/// Log generative model operations with provider context
#[macro_export]
macro_rules! log_llm_operation {
    (start, $operation:expr, provider = $provider:expr) => {
        tracing::info!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            "LLM operation started"
        );
    };
    (success, $operation:expr, provider = $provider:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            duration_ms = $duration,
            "LLM operation completed successfully"
        );
    };
    (error, $operation:expr, provider = $provider:expr, error = $error:expr) => {
        tracing::error!(
            component = "llm_service",
            operation = $operation,
            provider = %$provider,
            error = %$error,
            "LLM operation failed"
        );
    };
    (fallback, $operation:expr, $reason:expr) => {
        tracing::warn!(
            component = "llm_service",
            operation = $operation,
            reason = %$reason,
            "Serving canned fallback response"
        );
    };
}

/// Log speech synthesis operations
#[macro_export]
macro_rules! log_speech_operation {
    (success, $operation:expr, voice_id = $voice_id:expr, bytes = $bytes:expr) => {
        tracing::info!(
            component = "speech_service",
            operation = $operation,
            voice_id = %$voice_id,
            audio_bytes = $bytes,
            "Speech operation completed successfully"
        );
    };
    (error, $operation:expr, error = $error:expr) => {
        tracing::error!(
            component = "speech_service",
            operation = $operation,
            error = %$error,
            "Speech operation failed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and configuration events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        let student_id = 7_i64;
        let flashcard_id = 12_i64;
        let error = anyhow::anyhow!("test error");

        log_api_start!("test_operation", student_id = student_id);
        log_api_start!("test_operation", flashcard_id = flashcard_id);
        log_api_start!("test_operation");

        log_api_success!("test_operation", student_id = student_id, "operation completed");
        log_api_success!("test_operation", count = 5, "records listed");
        log_api_success!("test_operation", "done");

        log_api_warn!("test_operation", student_id = student_id, "operation warning");
        log_api_error!("test_operation", error = error, "operation failed");

        log_service_success!("gamification_service", "log_activity", student_id = student_id, "streak advanced");
        log_service_warn!("student_service", "change_pin", "incorrect old PIN");

        log_db_operation!(info, "migrate", "schema is up to date");

        log_llm_operation!(start, "lesson_plan", provider = "Gemini");
        log_llm_operation!(success, "lesson_plan", provider = "Gemini", duration_ms = 1500);
        log_llm_operation!(fallback, "greet", "no API key configured");

        log_speech_operation!(success, "synthesize", voice_id = "voice-1", bytes = 2048);

        log_system_event!(startup, component = "server", "server starting");
        log_system_event!(config, "configuration loaded successfully");

        log_validation!(success, "api_request", "request validated");
        log_validation!(failure, "api_request", error = "score exceeds total");
    }
}
