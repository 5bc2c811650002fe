//! VibrationVIEW automation HRESULT codes
//!
//! `MAKE_HRESULT(severity, FACILITY_ITF, code)`: errors are
//! `0x80040000 | code`, success codes `0x00040000 | code`. Values are kept
//! as signed 32-bit integers, the form the automation layer reports.

use serde::Serialize;

/// Wrapper error raised when the automation call itself throws
pub const DISP_E_EXCEPTION: i32 = 0x8002_0009_u32 as i32;

pub const VVIEW_E_ALREADY_RUNNING: i32 = 0x8004_0200_u32 as i32;
pub const VVIEW_E_TEST_NOT_FOUND: i32 = 0x8004_0202_u32 as i32;
pub const VVIEW_E_KEY_NOT_FOUND: i32 = 0x8004_0203_u32 as i32;
pub const VVIEW_E_NO_SUCH_DIRECTORY: i32 = 0x8004_0204_u32 as i32;
pub const VVIEW_E_CANT_CREATE_FILE: i32 = 0x8004_0205_u32 as i32;
pub const VVIEW_E_FILE_EXISTS: i32 = 0x8004_0206_u32 as i32;
pub const VVIEW_E_STRING_CONVERSION_FAILED: i32 = 0x8004_0208_u32 as i32;
pub const VVIEW_E_NO_DATA: i32 = 0x8004_0209_u32 as i32;
pub const VVIEW_E_WAITING_FOR_BOX: i32 = 0x8004_020b_u32 as i32;
pub const VVIEW_E_ACTIVEX_KEYMISSING: i32 = 0x8004_020c_u32 as i32;
pub const VVIEW_E_UNDEFINED: i32 = 0x8004_020d_u32 as i32;
pub const VVIEW_E_WRONG_NUMBER_DIMS: i32 = 0x8004_020e_u32 as i32;
pub const VVIEW_E_WRONG_DATATYPE: i32 = 0x8004_020f_u32 as i32;
pub const VVIEW_E_TED_TEMPLATE_MISSING: i32 = 0x8004_0210_u32 as i32;
pub const VVIEW_E_RECORDING: i32 = 0x8004_0211_u32 as i32;
pub const VVIEW_E_FAILEDTOSAVE: i32 = 0x8004_0212_u32 as i32;
pub const VVIEW_E_WINDOWSERROR: i32 = 0x8004_0214_u32 as i32;
pub const VVIEW_E_BADPARAMETER: i32 = 0x8004_0215_u32 as i32;
pub const VVIEW_E_WRONGTESTMODE: i32 = 0x8004_0216_u32 as i32;
pub const VVIEW_E_TRANSIENT_KEYMISSING: i32 = 0x8004_0217_u32 as i32;
pub const VVIEW_E_LENGTH_MISMATCH: i32 = 0x8004_0218_u32 as i32;
pub const VVIEW_E_FAILED_INPUT_CONFIG: i32 = 0x8004_0219_u32 as i32;
pub const VVIEW_E_UNEXPECTED: i32 = 0x8004_021a_u32 as i32;
pub const VVIEW_E_MISMATCH: i32 = 0x8004_021b_u32 as i32;
pub const VVIEW_E_PRETESTCANTRESUME: i32 = 0x8004_021c_u32 as i32;
pub const VVIEW_E_DATABASE_NOT_AVAILABLE: i32 = 0x8004_021d_u32 as i32;

pub const VVIEW_S_NOT_RUNNING: i32 = 0x0004_0201;
pub const VVIEW_S_NO_DIALOG_OPEN: i32 = 0x0004_0207;
pub const VVIEW_S_SHORTER_THAN_REQUESTED: i32 = 0x0004_020a;
pub const VVIEW_S_WAITING_FOR_BOX: i32 = 0x0004_0213;

const ERROR_NAMES: &[(i32, &str)] = &[
    (DISP_E_EXCEPTION, "COM dispatch exception"),
    (VVIEW_E_ALREADY_RUNNING, "Test is already running"),
    (VVIEW_S_NOT_RUNNING, "Test is already stopped"),
    (VVIEW_E_TEST_NOT_FOUND, "Test not found"),
    (VVIEW_E_KEY_NOT_FOUND, "Key not found"),
    (VVIEW_E_NO_SUCH_DIRECTORY, "No such directory"),
    (VVIEW_E_CANT_CREATE_FILE, "Can't create file"),
    (VVIEW_E_FILE_EXISTS, "File exists"),
    (VVIEW_S_NO_DIALOG_OPEN, "No dialog open"),
    (VVIEW_E_STRING_CONVERSION_FAILED, "String conversion failed"),
    (VVIEW_E_NO_DATA, "No data available"),
    (VVIEW_S_SHORTER_THAN_REQUESTED, "Vector was shorter than requested"),
    (VVIEW_E_WAITING_FOR_BOX, "Waiting for IOBox to initialize error"),
    (VVIEW_E_ACTIVEX_KEYMISSING, "Automation Interface Software option is not enabled"),
    (VVIEW_E_UNDEFINED, "Undefined Error"),
    (VVIEW_E_WRONG_NUMBER_DIMS, "Wrong number of dimensions in requested array"),
    (VVIEW_E_WRONG_DATATYPE, "Return array has improper datatype"),
    (VVIEW_E_TED_TEMPLATE_MISSING, "TEDs template file not found"),
    (VVIEW_E_RECORDING, "Recording is already running"),
    (VVIEW_E_FAILEDTOSAVE, "File failed to save"),
    (VVIEW_S_WAITING_FOR_BOX, "Waiting for IOBox to initialize warning"),
    (VVIEW_E_WINDOWSERROR, "Windows returned an error"),
    (VVIEW_E_BADPARAMETER, "Passed an invalid parameter value"),
    (VVIEW_E_WRONGTESTMODE, "Wrong test mode for requested operation"),
    (VVIEW_E_TRANSIENT_KEYMISSING, "Transient Caption Software option is not enabled"),
    (VVIEW_E_LENGTH_MISMATCH, "Length mismatch"),
    (VVIEW_E_FAILED_INPUT_CONFIG, "Failed loading input configuration"),
    (VVIEW_E_UNEXPECTED, "Unexpected error"),
    (VVIEW_E_MISMATCH, "Data mismatch"),
    (VVIEW_E_PRETESTCANTRESUME, "Can't resume after pretest"),
    (VVIEW_E_DATABASE_NOT_AVAILABLE, "Database not available"),
];

/// Code and readable name of an automation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComErrorInfo {
    pub code: i32,
    pub name: String,
}

/// Human-readable name, `UNKNOWN_ERROR_<code>` for codes not in the table
pub fn error_name(scode: i32) -> String {
    ERROR_NAMES
        .iter()
        .find(|(code, _)| *code == scode)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("UNKNOWN_ERROR_{}", scode))
}

pub fn error_info(scode: i32) -> ComErrorInfo {
    ComErrorInfo {
        code: scode,
        name: error_name(scode),
    }
}

/// Success-severity codes are warnings rather than failures
pub fn is_success_code(scode: i32) -> bool {
    scode >= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_signed_hresults() {
        assert_eq!(DISP_E_EXCEPTION, -2147352567);
        assert_eq!(VVIEW_E_ALREADY_RUNNING, -2147220992);
        assert_eq!(VVIEW_E_DATABASE_NOT_AVAILABLE, -2147220963);
        assert_eq!(VVIEW_S_NOT_RUNNING, 262657);
        assert_eq!(VVIEW_S_WAITING_FOR_BOX, 262675);
    }

    #[test]
    fn known_and_unknown_names() {
        assert_eq!(error_name(VVIEW_E_TEST_NOT_FOUND), "Test not found");
        assert_eq!(error_name(42), "UNKNOWN_ERROR_42");
        assert_eq!(
            error_info(VVIEW_E_BADPARAMETER),
            ComErrorInfo {
                code: -2147220971,
                name: "Passed an invalid parameter value".into()
            }
        );
    }

    #[test]
    fn severity_bit_decides_success() {
        assert!(is_success_code(VVIEW_S_NO_DIALOG_OPEN));
        assert!(!is_success_code(VVIEW_E_NO_DATA));
    }
}
