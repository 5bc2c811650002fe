//! Endpoint index

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::response::success;
use crate::AppState;

/// (methods, path, description)
const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/health", "Service health and VibrationVIEW connectivity"),
    ("GET", "/api/docs", "This endpoint index"),
    // Basic control
    ("GET|POST", "/api/starttest", "Start the current test"),
    ("GET|POST", "/api/stoptest", "Stop the running test"),
    ("GET|POST", "/api/resumetest", "Resume a stopped test"),
    ("GET|POST", "/api/opentest", "Open a test profile by name (?testname= or unnamed)"),
    ("PUT", "/api/opentest", "Upload a test profile and open it"),
    ("GET|POST", "/api/runtest", "Open and run a test profile by name"),
    ("PUT", "/api/runtest", "Upload a test profile and run it"),
    ("GET|POST", "/api/closetest", "Close an open test by profile name"),
    ("GET|POST", "/api/closetab", "Close a test tab by index (?tabindex=)"),
    ("GET", "/api/listopentests", "List open tests"),
    // GUI
    ("GET|POST|PUT", "/api/edittest", "Open a test in the editor, optionally uploading it first"),
    ("GET", "/api/abortedit", "Abandon the current edit session"),
    // Status
    ("GET", "/api/status", "Raw stop code and status colour"),
    ("GET", "/api/isready", "Controller ready flag"),
    ("GET", "/api/isrunning", "Test running flag"),
    ("GET", "/api/isstarting", "Test starting flag"),
    ("GET", "/api/ischanginglevel", "Level change in progress flag"),
    ("GET", "/api/isholdlevel", "Hold level flag"),
    ("GET", "/api/isopenloop", "Open loop flag"),
    ("GET", "/api/isaborted", "Test aborted flag"),
    ("GET", "/api/canresumetest", "Resume possible flag"),
    ("GET", "/api/allstatus", "Every status flag in one call"),
    // Data
    ("GET", "/api/demand", "Demand values per loop"),
    ("GET", "/api/control", "Control values per loop"),
    ("GET", "/api/channel", "Input channel values"),
    ("GET", "/api/output", "Drive output values"),
    ("GET", "/api/channelunit", "Unit of a channel (?channelnum=, 1-based)"),
    ("GET", "/api/channellabel", "Label of a channel (?channelnum=, 1-based)"),
    ("GET", "/api/controlunit", "Unit of a control loop (?loopnum=, default 1)"),
    ("GET", "/api/controllabel", "Label of a control loop (?loopnum=, default 1)"),
    ("GET|POST", "/api/getdatafile", "Download a data file (defaults to the last data file)"),
    // Vectors
    ("GET|POST", "/api/vector", "Vector data (?vectorenum=&columns=)"),
    ("GET", "/api/vectorunit", "Vector unit"),
    ("GET", "/api/vectorlabel", "Vector label"),
    ("GET", "/api/vectorlength", "Vector length"),
    // Hardware
    ("GET", "/api/gethardwareinputchannels", "Number of hardware input channels"),
    ("GET", "/api/gethardwareoutputchannels", "Number of hardware output channels"),
    ("GET", "/api/gethardwareserialnumber", "Hardware serial number"),
    ("GET", "/api/getsoftwareversion", "VibrationVIEW software version"),
    ("GET", "/api/hardwaresupportscapacitorcoupled", "Capacitor coupling support of an input channel"),
    ("GET", "/api/hardwaresupportsaccelpowersource", "Accelerometer power support of an input channel"),
    ("GET", "/api/hardwaresupportsdifferential", "Differential input support of an input channel"),
    // Rear inputs
    ("GET", "/api/rearinput", "Rear input values"),
    ("GET", "/api/rearinputunit", "Unit of a rear input (?channel=, 1-based)"),
    ("GET", "/api/rearinputlabel", "Label of a rear input (?channel=, 1-based)"),
    // Input configuration
    ("GET", "/api/inputcaldate", "Calibration date of an input channel"),
    ("GET", "/api/inputserialnumber", "Serial number of an input channel"),
    ("GET", "/api/inputsensitivity", "Sensitivity of an input channel"),
    ("GET", "/api/inputengineeringscale", "Engineering scale of an input channel"),
    ("GET|POST", "/api/inputcapacitorcoupled", "Read or set capacitor coupling (?<ch>&<true|false>)"),
    ("GET|POST", "/api/inputaccelpowersource", "Read or set accelerometer power (?<ch>&<true|false>)"),
    ("GET|POST", "/api/inputdifferential", "Read or set differential input (?<ch>&<true|false>)"),
    ("POST", "/api/inputmode", "Set power source, coupling and differential together"),
    ("GET|POST", "/api/inputcalibration", "Set sensitivity, serial number and calibration date"),
    ("GET", "/api/inputconfigurationfile", "Current input configuration file"),
    ("POST", "/api/inputconfigurationfile", "Load an input configuration file by name"),
    ("PUT", "/api/inputconfigurationfile", "Upload an input configuration file and load it"),
    // Recording
    ("GET|POST", "/api/recordstart", "Start recording"),
    ("GET|POST", "/api/recordstop", "Stop recording"),
    ("GET|POST", "/api/recordpause", "Pause recording"),
    ("GET", "/api/recordgetfilename", "File name of the last recording"),
    // Virtual channels
    ("GET|POST", "/api/removeallvirtualchannels", "Remove every virtual channel"),
    ("GET", "/api/importvirtualchannels", "Import virtual channels from a file by name"),
    ("POST|PUT", "/api/importvirtualchannels", "Upload a virtual channel file and import it"),
    // TEDS
    ("GET", "/api/inputteds", "Raw TEDS for every input channel"),
    ("GET", "/api/inputtedschannel", "Raw TEDS for one input channel"),
    ("GET", "/api/teds", "Normalized TEDS for one or all channels"),
    ("GET|POST", "/api/tedsread", "Read TEDS from the hardware"),
    ("GET|POST", "/api/tedsreadandapply", "Read TEDS and apply it to the channel setup"),
    ("POST", "/api/tedsverifyandapply", "Verify transducers by URN and apply"),
    ("GET", "/api/tedsfromurn", "Normalized TEDS for a transducer URN"),
    // Reporting
    ("GET", "/api/reportfield", "Single report field value"),
    ("POST", "/api/reportfields", "Report fields expanded over channels and loops"),
    ("POST", "/api/generatereport", "Generate a report from a data file on disk"),
    ("PUT", "/api/generatereport", "Generate a report from an uploaded data file"),
];

/// GET /api/docs
pub async fn docs(State(state): State<AppState>) -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(methods, path, description)| {
            json!({
                "methods": methods.split('|').collect::<Vec<_>>(),
                "path": path,
                "description": description,
            })
        })
        .collect();

    success(
        json!({
            "api_version": state.config.api_version,
            "count": endpoints.len(),
            "endpoints": endpoints,
        }),
        "VibrationVIEW REST API endpoints",
    )
}

pub fn docs_routes() -> Router<AppState> {
    Router::new().route("/docs", get(docs))
}
