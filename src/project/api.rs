//! Typed wrappers over the table methods.
//!
//! Each wrapper converts its arguments into [`Arg`]s, dispatches through
//! [`Project::call`] and converts the shaped output back into Rust types.
//! Indices follow the engine convention and start at 1.

use crate::engine::EngineHandle;
use crate::error::{Error, Result};
use crate::marshal::{Arg, CallOutput, Value};

use super::Project;
use super::types::{
    ActionCode, AnalysisStatistic, Coordinates, CountType, Curve, CurvePoint, CurveType,
    FlowUnits, HeadLossType, InitHydOption, LinkNodes, LinkProperty, LinkType, NextEvent,
    NodeProperty, NodeType, QualityInfo, QualityType, SimulationOption, StatusReport,
    TimeParameter, Title,
};

fn unknown_code(method: &str, code: i32) -> Error {
    Error::UnexpectedOutput {
        method: method.to_string(),
        expected: "a known enumeration code",
        actual: code.to_string(),
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl<E: EngineHandle> Project<E> {
    fn unit(&mut self, method: &str, args: &[Arg]) -> Result<()> {
        self.call(method, args)?.into_unit(method)
    }

    fn int(&mut self, method: &str, args: &[Arg]) -> Result<i32> {
        self.call(method, args)?.into_int(method)
    }

    fn long(&mut self, method: &str, args: &[Arg]) -> Result<i64> {
        self.call(method, args)?.into_long(method)
    }

    fn double(&mut self, method: &str, args: &[Arg]) -> Result<f64> {
        self.call(method, args)?.into_double(method)
    }

    fn string(&mut self, method: &str, args: &[Arg]) -> Result<String> {
        self.call(method, args)?.into_text(method)
    }

    fn record(&mut self, method: &str, args: &[Arg]) -> Result<CallOutput> {
        let output = self.call(method, args)?;
        match output {
            CallOutput::Record(_) => Ok(output),
            other => Err(Error::UnexpectedOutput {
                method: method.to_string(),
                expected: "a record",
                actual: format!("{other:?}"),
            }),
        }
    }

    // Project

    /// Start a project with no input file.
    pub fn init(
        &mut self,
        report_file: &str,
        output_file: &str,
        units: FlowUnits,
        head_loss: HeadLossType,
    ) -> Result<()> {
        self.unit(
            "init",
            &[report_file.into(), output_file.into(), units.into(), head_loss.into()],
        )
    }

    pub fn open(&mut self, input_file: &str, report_file: &str, output_file: &str) -> Result<()> {
        self.unit("open", &[input_file.into(), report_file.into(), output_file.into()])
    }

    /// Like [`open`](Self::open), but keeps the project usable when the
    /// input file has errors.
    pub fn open_x(&mut self, input_file: &str, report_file: &str, output_file: &str) -> Result<()> {
        self.unit("openX", &[input_file.into(), report_file.into(), output_file.into()])
    }

    pub fn close(&mut self) -> Result<()> {
        self.unit("close", &[])
    }

    pub fn save_inp_file(&mut self, path: &str) -> Result<()> {
        self.unit("saveInpFile", &[path.into()])
    }

    pub fn get_title(&mut self) -> Result<Title> {
        let method = "getTitle";
        let output = self.record(method, &[])?;
        Ok(Title {
            line1: output.field(method, "line1", text)?,
            line2: output.field(method, "line2", text)?,
            line3: output.field(method, "line3", text)?,
        })
    }

    pub fn set_title(&mut self, line1: &str, line2: &str, line3: &str) -> Result<()> {
        self.unit("setTitle", &[line1.into(), line2.into(), line3.into()])
    }

    pub fn get_count(&mut self, kind: CountType) -> Result<i32> {
        self.int("getCount", &[kind.into()])
    }

    // Hydraulic analysis

    pub fn solve_h(&mut self) -> Result<()> {
        self.unit("solveH", &[])
    }

    pub fn save_h(&mut self) -> Result<()> {
        self.unit("saveH", &[])
    }

    pub fn open_h(&mut self) -> Result<()> {
        self.unit("openH", &[])
    }

    pub fn init_h(&mut self, option: InitHydOption) -> Result<()> {
        self.unit("initH", &[option.into()])
    }

    /// Solve hydraulics at the current time, returning that time in seconds.
    pub fn run_h(&mut self) -> Result<i64> {
        self.long("runH", &[])
    }

    /// Advance to the next hydraulic event, returning the step taken.
    /// A step of 0 means the simulation is over.
    pub fn next_h(&mut self) -> Result<i64> {
        self.long("nextH", &[])
    }

    pub fn close_h(&mut self) -> Result<()> {
        self.unit("closeH", &[])
    }

    pub fn save_hyd_file(&mut self, path: &str) -> Result<()> {
        self.unit("saveHydFile", &[path.into()])
    }

    pub fn use_hyd_file(&mut self, path: &str) -> Result<()> {
        self.unit("useHydFile", &[path.into()])
    }

    // Water quality analysis

    pub fn solve_q(&mut self) -> Result<()> {
        self.unit("solveQ", &[])
    }

    pub fn open_q(&mut self) -> Result<()> {
        self.unit("openQ", &[])
    }

    pub fn init_q(&mut self, save: bool) -> Result<()> {
        self.unit("initQ", &[Arg::Int(i32::from(save))])
    }

    pub fn run_q(&mut self) -> Result<i64> {
        self.long("runQ", &[])
    }

    pub fn next_q(&mut self) -> Result<i64> {
        self.long("nextQ", &[])
    }

    /// Advance quality by one step, returning the simulation time left.
    pub fn step_q(&mut self) -> Result<i64> {
        self.long("stepQ", &[])
    }

    pub fn close_q(&mut self) -> Result<()> {
        self.unit("closeQ", &[])
    }

    // Reporting

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.unit("writeLine", &[line.into()])
    }

    pub fn report(&mut self) -> Result<()> {
        self.unit("report", &[])
    }

    pub fn copy_report(&mut self, path: &str) -> Result<()> {
        self.unit("copyReport", &[path.into()])
    }

    pub fn clear_report(&mut self) -> Result<()> {
        self.unit("clearReport", &[])
    }

    pub fn reset_report(&mut self) -> Result<()> {
        self.unit("resetReport", &[])
    }

    /// Apply one line of `[REPORT]` section syntax.
    pub fn set_report(&mut self, format: &str) -> Result<()> {
        self.unit("setReport", &[format.into()])
    }

    pub fn set_status_report(&mut self, level: StatusReport) -> Result<()> {
        self.unit("setStatusReport", &[level.into()])
    }

    pub fn get_statistic(&mut self, kind: AnalysisStatistic) -> Result<f64> {
        self.double("getStatistic", &[kind.into()])
    }

    pub fn time_to_next_event(&mut self) -> Result<NextEvent> {
        let method = "timeToNextEvent";
        let output = self.record(method, &[])?;
        Ok(NextEvent {
            event_type: output.field(method, "eventType", Value::as_i32)?,
            duration: output.field(method, "duration", Value::as_i64)?,
            element_index: output.field(method, "elementIndex", Value::as_i32)?,
        })
    }

    // Analysis options

    pub fn get_option(&mut self, option: SimulationOption) -> Result<f64> {
        self.double("getOption", &[option.into()])
    }

    pub fn set_option(&mut self, option: SimulationOption, value: f64) -> Result<()> {
        self.unit("setOption", &[option.into(), value.into()])
    }

    pub fn get_flow_units(&mut self) -> Result<FlowUnits> {
        let code = self.int("getFlowUnits", &[])?;
        FlowUnits::from_code(code).ok_or_else(|| unknown_code("getFlowUnits", code))
    }

    pub fn set_flow_units(&mut self, units: FlowUnits) -> Result<()> {
        self.unit("setFlowUnits", &[units.into()])
    }

    pub fn get_time_parameter(&mut self, parameter: TimeParameter) -> Result<i64> {
        self.long("getTimeParameter", &[parameter.into()])
    }

    pub fn set_time_parameter(&mut self, parameter: TimeParameter, value: i64) -> Result<()> {
        self.unit("setTimeParameter", &[parameter.into(), value.into()])
    }

    pub fn get_quality_info(&mut self) -> Result<QualityInfo> {
        let method = "getQualityInfo";
        let output = self.record(method, &[])?;
        let code = output.field(method, "qualType", Value::as_i32)?;
        Ok(QualityInfo {
            quality_type: QualityType::from_code(code).ok_or_else(|| unknown_code(method, code))?,
            chem_name: output.field(method, "chemName", text)?,
            chem_units: output.field(method, "chemUnits", text)?,
            trace_node: output.field(method, "traceNode", Value::as_i32)?,
        })
    }

    /// Quality analysis type and trace node index.
    pub fn get_quality_type(&mut self) -> Result<(QualityType, i32)> {
        let method = "getQualityType";
        let output = self.record(method, &[])?;
        let code = output.field(method, "qualType", Value::as_i32)?;
        let kind = QualityType::from_code(code).ok_or_else(|| unknown_code(method, code))?;
        Ok((kind, output.field(method, "traceNode", Value::as_i32)?))
    }

    pub fn set_quality_type(
        &mut self,
        kind: QualityType,
        chem_name: &str,
        chem_units: &str,
        trace_node: &str,
    ) -> Result<()> {
        self.unit(
            "setQualityType",
            &[kind.into(), chem_name.into(), chem_units.into(), trace_node.into()],
        )
    }

    // Nodes

    /// Add a node, returning its index.
    pub fn add_node(&mut self, id: &str, kind: NodeType) -> Result<i32> {
        self.int("addNode", &[id.into(), kind.into()])
    }

    pub fn delete_node(&mut self, index: i32, action: ActionCode) -> Result<()> {
        self.unit("deleteNode", &[index.into(), action.into()])
    }

    pub fn get_node_index(&mut self, id: &str) -> Result<i32> {
        self.int("getNodeIndex", &[id.into()])
    }

    pub fn get_node_id(&mut self, index: i32) -> Result<String> {
        self.string("getNodeId", &[index.into()])
    }

    pub fn set_node_id(&mut self, index: i32, id: &str) -> Result<()> {
        self.unit("setNodeId", &[index.into(), id.into()])
    }

    pub fn get_node_type(&mut self, index: i32) -> Result<NodeType> {
        let code = self.int("getNodeType", &[index.into()])?;
        NodeType::from_code(code).ok_or_else(|| unknown_code("getNodeType", code))
    }

    pub fn get_node_value(&mut self, index: i32, property: NodeProperty) -> Result<f64> {
        self.double("getNodeValue", &[index.into(), property.into()])
    }

    pub fn set_node_value(&mut self, index: i32, property: NodeProperty, value: f64) -> Result<()> {
        self.unit("setNodeValue", &[index.into(), property.into(), value.into()])
    }

    pub fn set_junction_data(
        &mut self,
        index: i32,
        elevation: f64,
        demand: f64,
        demand_pattern: &str,
    ) -> Result<()> {
        self.unit(
            "setJunctionData",
            &[index.into(), elevation.into(), demand.into(), demand_pattern.into()],
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_tank_data(
        &mut self,
        index: i32,
        elevation: f64,
        init_level: f64,
        min_level: f64,
        max_level: f64,
        diameter: f64,
        min_volume: f64,
        volume_curve: &str,
    ) -> Result<()> {
        self.unit(
            "setTankData",
            &[
                index.into(),
                elevation.into(),
                init_level.into(),
                min_level.into(),
                max_level.into(),
                diameter.into(),
                min_volume.into(),
                volume_curve.into(),
            ],
        )
    }

    pub fn get_coordinates(&mut self, index: i32) -> Result<Coordinates> {
        let method = "getCoordinates";
        let output = self.record(method, &[index.into()])?;
        Ok(Coordinates {
            x: output.field(method, "x", Value::as_f64)?,
            y: output.field(method, "y", Value::as_f64)?,
        })
    }

    pub fn set_coordinates(&mut self, index: i32, at: Coordinates) -> Result<()> {
        self.unit("setCoordinates", &[index.into(), at.x.into(), at.y.into()])
    }

    // Links

    /// Add a link between two nodes given by ID, returning its index.
    pub fn add_link(&mut self, id: &str, kind: LinkType, from: &str, to: &str) -> Result<i32> {
        self.int("addLink", &[id.into(), kind.into(), from.into(), to.into()])
    }

    pub fn delete_link(&mut self, index: i32, action: ActionCode) -> Result<()> {
        self.unit("deleteLink", &[index.into(), action.into()])
    }

    pub fn get_link_index(&mut self, id: &str) -> Result<i32> {
        self.int("getLinkIndex", &[id.into()])
    }

    pub fn get_link_id(&mut self, index: i32) -> Result<String> {
        self.string("getLinkId", &[index.into()])
    }

    pub fn set_link_id(&mut self, index: i32, id: &str) -> Result<()> {
        self.unit("setLinkId", &[index.into(), id.into()])
    }

    pub fn get_link_type(&mut self, index: i32) -> Result<LinkType> {
        let code = self.int("getLinkType", &[index.into()])?;
        LinkType::from_code(code).ok_or_else(|| unknown_code("getLinkType", code))
    }

    pub fn get_link_nodes(&mut self, index: i32) -> Result<LinkNodes> {
        let method = "getLinkNodes";
        let output = self.record(method, &[index.into()])?;
        Ok(LinkNodes {
            node1: output.field(method, "node1", Value::as_i32)?,
            node2: output.field(method, "node2", Value::as_i32)?,
        })
    }

    pub fn set_link_nodes(&mut self, index: i32, node1: i32, node2: i32) -> Result<()> {
        self.unit("setLinkNodes", &[index.into(), node1.into(), node2.into()])
    }

    pub fn get_link_value(&mut self, index: i32, property: LinkProperty) -> Result<f64> {
        self.double("getLinkValue", &[index.into(), property.into()])
    }

    pub fn set_link_value(&mut self, index: i32, property: LinkProperty, value: f64) -> Result<()> {
        self.unit("setLinkValue", &[index.into(), property.into(), value.into()])
    }

    pub fn set_pipe_data(
        &mut self,
        index: i32,
        length: f64,
        diameter: f64,
        roughness: f64,
        minor_loss: f64,
    ) -> Result<()> {
        self.unit(
            "setPipeData",
            &[
                index.into(),
                length.into(),
                diameter.into(),
                roughness.into(),
                minor_loss.into(),
            ],
        )
    }

    // Time patterns

    pub fn add_pattern(&mut self, id: &str) -> Result<()> {
        self.unit("addPattern", &[id.into()])
    }

    pub fn delete_pattern(&mut self, index: i32) -> Result<()> {
        self.unit("deletePattern", &[index.into()])
    }

    pub fn get_pattern_index(&mut self, id: &str) -> Result<i32> {
        self.int("getPatternIndex", &[id.into()])
    }

    pub fn get_pattern_id(&mut self, index: i32) -> Result<String> {
        self.string("getPatternId", &[index.into()])
    }

    pub fn set_pattern_id(&mut self, index: i32, id: &str) -> Result<()> {
        self.unit("setPatternId", &[index.into(), id.into()])
    }

    pub fn get_pattern_length(&mut self, index: i32) -> Result<i32> {
        self.int("getPatternLength", &[index.into()])
    }

    pub fn get_pattern_value(&mut self, index: i32, period: i32) -> Result<f64> {
        self.double("getPatternValue", &[index.into(), period.into()])
    }

    pub fn set_pattern_value(&mut self, index: i32, period: i32, value: f64) -> Result<()> {
        self.unit("setPatternValue", &[index.into(), period.into(), value.into()])
    }

    pub fn get_average_pattern_value(&mut self, index: i32) -> Result<f64> {
        self.double("getAveragePatternValue", &[index.into()])
    }

    /// Replace all multipliers of a pattern.
    pub fn set_pattern(&mut self, index: i32, values: &[f64]) -> Result<()> {
        self.unit("setPattern", &[index.into(), values.into()])
    }

    pub fn load_pattern_file(&mut self, path: &str, id: &str) -> Result<()> {
        self.unit("loadPatternFile", &[path.into(), id.into()])
    }

    /// Every multiplier of a pattern, in period order.
    pub fn get_pattern(&mut self, index: i32) -> Result<Vec<f64>> {
        let length = self.get_pattern_length(index)?;
        (1..=length)
            .map(|period| self.get_pattern_value(index, period))
            .collect()
    }

    // Data curves

    pub fn add_curve(&mut self, id: &str) -> Result<()> {
        self.unit("addCurve", &[id.into()])
    }

    pub fn delete_curve(&mut self, index: i32) -> Result<()> {
        self.unit("deleteCurve", &[index.into()])
    }

    pub fn get_curve_index(&mut self, id: &str) -> Result<i32> {
        self.int("getCurveIndex", &[id.into()])
    }

    pub fn get_curve_id(&mut self, index: i32) -> Result<String> {
        self.string("getCurveId", &[index.into()])
    }

    pub fn set_curve_id(&mut self, index: i32, id: &str) -> Result<()> {
        self.unit("setCurveId", &[index.into(), id.into()])
    }

    pub fn get_curve_length(&mut self, index: i32) -> Result<i32> {
        self.int("getCurveLength", &[index.into()])
    }

    pub fn get_curve_type(&mut self, index: i32) -> Result<CurveType> {
        let code = self.int("getCurveType", &[index.into()])?;
        CurveType::from_code(code).ok_or_else(|| unknown_code("getCurveType", code))
    }

    pub fn set_curve_type(&mut self, index: i32, kind: CurveType) -> Result<()> {
        self.unit("setCurveType", &[index.into(), kind.into()])
    }

    pub fn get_curve_value(&mut self, index: i32, point: i32) -> Result<CurvePoint> {
        let method = "getCurveValue";
        let output = self.record(method, &[index.into(), point.into()])?;
        Ok(CurvePoint {
            x: output.field(method, "x", Value::as_f64)?,
            y: output.field(method, "y", Value::as_f64)?,
        })
    }

    pub fn set_curve_value(&mut self, index: i32, point: i32, x: f64, y: f64) -> Result<()> {
        self.unit("setCurveValue", &[index.into(), point.into(), x.into(), y.into()])
    }

    /// Replace all points of a curve. `x` and `y` must have equal lengths.
    pub fn set_curve(&mut self, index: i32, x: &[f64], y: &[f64]) -> Result<()> {
        self.unit("setCurve", &[index.into(), x.into(), y.into()])
    }

    /// A curve's ID and every point, in order.
    pub fn get_curve(&mut self, index: i32) -> Result<Curve> {
        let id = self.get_curve_id(index)?;
        let length = self.get_curve_length(index)?;
        let points = (1..=length)
            .map(|point| self.get_curve_value(index, point))
            .collect::<Result<Vec<_>>>()?;
        Ok(Curve { id, points })
    }

    // Simple controls

    pub fn get_control_enabled(&mut self, index: i32) -> Result<bool> {
        Ok(self.int("getControlEnabled", &[index.into()])? != 0)
    }

    pub fn set_control_enabled(&mut self, index: i32, enabled: bool) -> Result<()> {
        self.unit("setControlEnabled", &[index.into(), Arg::Int(i32::from(enabled))])
    }
}
