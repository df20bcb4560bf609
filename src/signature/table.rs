//! The EPANET toolkit signature table.
//!
//! `EN_createproject`, `EN_deleteproject`, `EN_getversion` and
//! `EN_geterror` are not listed: they run before a project handle or a
//! version exists, or take no handle at all.

use super::ArgSpec::{LengthOf, NumberArray, Scalar, StringPointer};
use super::OutputKind::{Double, Id, Int, Long, Title};
use super::{MethodDescriptor as M, out};
use crate::version::EngineVersion;

const V2_3: EngineVersion = EngineVersion::new(2, 3, 0);

/// Public method name to marshalling metadata.
pub static SIGNATURE_TABLE: &[(&str, M)] = &[
    // Project
    ("init", M::new("EN_init", &[StringPointer, StringPointer, Scalar, Scalar], &[])),
    ("open", M::new("EN_open", &[StringPointer, StringPointer, StringPointer], &[])),
    ("openX", M::new("EN_openX", &[StringPointer, StringPointer, StringPointer], &[]).since(V2_3)),
    ("close", M::new("EN_close", &[], &[])),
    ("saveInpFile", M::new("EN_saveinpfile", &[StringPointer], &[])),
    ("getTitle", M::new("EN_gettitle", &[], &[out("line1", Title), out("line2", Title), out("line3", Title)])),
    ("setTitle", M::new("EN_settitle", &[StringPointer, StringPointer, StringPointer], &[])),
    ("getCount", M::new("EN_getcount", &[Scalar], &[out("count", Int)])),
    // Hydraulic analysis
    ("solveH", M::new("EN_solveH", &[], &[])),
    ("saveH", M::new("EN_saveH", &[], &[])),
    ("openH", M::new("EN_openH", &[], &[])),
    ("initH", M::new("EN_initH", &[Scalar], &[])),
    ("runH", M::new("EN_runH", &[], &[out("currentTime", Long)])),
    ("nextH", M::new("EN_nextH", &[], &[out("tStep", Long)])),
    ("closeH", M::new("EN_closeH", &[], &[])),
    ("saveHydFile", M::new("EN_savehydfile", &[StringPointer], &[])),
    ("useHydFile", M::new("EN_usehydfile", &[StringPointer], &[])),
    // Water quality analysis
    ("solveQ", M::new("EN_solveQ", &[], &[])),
    ("openQ", M::new("EN_openQ", &[], &[])),
    ("initQ", M::new("EN_initQ", &[Scalar], &[])),
    ("runQ", M::new("EN_runQ", &[], &[out("currentTime", Long)])),
    ("nextQ", M::new("EN_nextQ", &[], &[out("tStep", Long)])),
    ("stepQ", M::new("EN_stepQ", &[], &[out("timeLeft", Long)])),
    ("closeQ", M::new("EN_closeQ", &[], &[])),
    // Reporting
    ("writeLine", M::new("EN_writeline", &[StringPointer], &[])),
    ("report", M::new("EN_report", &[], &[])),
    ("copyReport", M::new("EN_copyreport", &[StringPointer], &[])),
    ("clearReport", M::new("EN_clearreport", &[], &[])),
    ("resetReport", M::new("EN_resetreport", &[], &[])),
    ("setReport", M::new("EN_setreport", &[StringPointer], &[])),
    ("setStatusReport", M::new("EN_setstatusreport", &[Scalar], &[])),
    ("getStatistic", M::new("EN_getstatistic", &[Scalar], &[out("value", Double)])),
    ("timeToNextEvent", M::new("EN_timetonextevent", &[], &[out("eventType", Int), out("duration", Long), out("elementIndex", Int)]).since(V2_3)),
    // Analysis options
    ("getOption", M::new("EN_getoption", &[Scalar], &[out("value", Double)])),
    ("setOption", M::new("EN_setoption", &[Scalar, Scalar], &[])),
    ("getFlowUnits", M::new("EN_getflowunits", &[], &[out("units", Int)])),
    ("setFlowUnits", M::new("EN_setflowunits", &[Scalar], &[])),
    ("getTimeParameter", M::new("EN_gettimeparam", &[Scalar], &[out("value", Long)])),
    ("setTimeParameter", M::new("EN_settimeparam", &[Scalar, Scalar], &[])),
    ("getQualityInfo", M::new("EN_getqualinfo", &[], &[out("qualType", Int), out("chemName", Id), out("chemUnits", Id), out("traceNode", Int)])),
    ("getQualityType", M::new("EN_getqualtype", &[], &[out("qualType", Int), out("traceNode", Int)])),
    ("setQualityType", M::new("EN_setqualtype", &[Scalar, StringPointer, StringPointer, StringPointer], &[])),
    // Nodes
    ("addNode", M::new("EN_addnode", &[StringPointer, Scalar], &[out("index", Int)])),
    ("deleteNode", M::new("EN_deletenode", &[Scalar, Scalar], &[])),
    ("getNodeIndex", M::new("EN_getnodeindex", &[StringPointer], &[out("index", Int)])),
    ("getNodeId", M::new("EN_getnodeid", &[Scalar], &[out("id", Id)])),
    ("setNodeId", M::new("EN_setnodeid", &[Scalar, StringPointer], &[])),
    ("getNodeType", M::new("EN_getnodetype", &[Scalar], &[out("type", Int)])),
    ("getNodeValue", M::new("EN_getnodevalue", &[Scalar, Scalar], &[out("value", Double)])),
    ("setNodeValue", M::new("EN_setnodevalue", &[Scalar, Scalar, Scalar], &[])),
    ("setJunctionData", M::new("EN_setjuncdata", &[Scalar, Scalar, Scalar, StringPointer], &[])),
    ("setTankData", M::new("EN_settankdata", &[Scalar, Scalar, Scalar, Scalar, Scalar, Scalar, Scalar, StringPointer], &[])),
    ("getCoordinates", M::new("EN_getcoord", &[Scalar], &[out("x", Double), out("y", Double)])),
    ("setCoordinates", M::new("EN_setcoord", &[Scalar, Scalar, Scalar], &[])),
    // Links
    ("addLink", M::new("EN_addlink", &[StringPointer, Scalar, StringPointer, StringPointer], &[out("index", Int)])),
    ("deleteLink", M::new("EN_deletelink", &[Scalar, Scalar], &[])),
    ("getLinkIndex", M::new("EN_getlinkindex", &[StringPointer], &[out("index", Int)])),
    ("getLinkId", M::new("EN_getlinkid", &[Scalar], &[out("id", Id)])),
    ("setLinkId", M::new("EN_setlinkid", &[Scalar, StringPointer], &[])),
    ("getLinkType", M::new("EN_getlinktype", &[Scalar], &[out("type", Int)])),
    ("getLinkNodes", M::new("EN_getlinknodes", &[Scalar], &[out("node1", Int), out("node2", Int)])),
    ("setLinkNodes", M::new("EN_setlinknodes", &[Scalar, Scalar, Scalar], &[])),
    ("getLinkValue", M::new("EN_getlinkvalue", &[Scalar, Scalar], &[out("value", Double)])),
    ("setLinkValue", M::new("EN_setlinkvalue", &[Scalar, Scalar, Scalar], &[])),
    ("setPipeData", M::new("EN_setpipedata", &[Scalar, Scalar, Scalar, Scalar, Scalar], &[])),
    // Time patterns
    ("addPattern", M::new("EN_addpattern", &[StringPointer], &[])),
    ("deletePattern", M::new("EN_deletepattern", &[Scalar], &[])),
    ("getPatternIndex", M::new("EN_getpatternindex", &[StringPointer], &[out("index", Int)])),
    ("getPatternId", M::new("EN_getpatternid", &[Scalar], &[out("id", Id)])),
    ("setPatternId", M::new("EN_setpatternid", &[Scalar, StringPointer], &[])),
    ("getPatternLength", M::new("EN_getpatternlen", &[Scalar], &[out("length", Int)])),
    ("getPatternValue", M::new("EN_getpatternvalue", &[Scalar, Scalar], &[out("value", Double)])),
    ("setPatternValue", M::new("EN_setpatternvalue", &[Scalar, Scalar, Scalar], &[])),
    ("getAveragePatternValue", M::new("EN_getaveragepatternvalue", &[Scalar], &[out("value", Double)])),
    ("setPattern", M::new("EN_setpattern", &[Scalar, NumberArray("values"), LengthOf("values")], &[])),
    ("loadPatternFile", M::new("EN_loadpatternfile", &[StringPointer, StringPointer], &[]).since(V2_3)),
    // Data curves
    ("addCurve", M::new("EN_addcurve", &[StringPointer], &[])),
    ("deleteCurve", M::new("EN_deletecurve", &[Scalar], &[])),
    ("getCurveIndex", M::new("EN_getcurveindex", &[StringPointer], &[out("index", Int)])),
    ("getCurveId", M::new("EN_getcurveid", &[Scalar], &[out("id", Id)])),
    ("setCurveId", M::new("EN_setcurveid", &[Scalar, StringPointer], &[])),
    ("getCurveLength", M::new("EN_getcurvelen", &[Scalar], &[out("length", Int)])),
    ("getCurveType", M::new("EN_getcurvetype", &[Scalar], &[out("type", Int)])),
    ("setCurveType", M::new("EN_setcurvetype", &[Scalar, Scalar], &[]).since(V2_3)),
    ("getCurveValue", M::new("EN_getcurvevalue", &[Scalar, Scalar], &[out("x", Double), out("y", Double)])),
    ("setCurveValue", M::new("EN_setcurvevalue", &[Scalar, Scalar, Scalar, Scalar], &[])),
    ("setCurve", M::new("EN_setcurve", &[Scalar, NumberArray("x"), NumberArray("y"), LengthOf("x")], &[])),
    // Simple controls
    ("getControlEnabled", M::new("EN_getcontrolenabled", &[Scalar], &[out("enabled", Int)]).since(V2_3)),
    ("setControlEnabled", M::new("EN_setcontrolenabled", &[Scalar, Scalar], &[]).since(V2_3)),
];
