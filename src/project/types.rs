//! EPANET enumeration codes and record types returned by the typed API.

use crate::marshal::Arg;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Integer code understood by the engine.
            pub const fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl From<$name> for Arg {
            fn from(value: $name) -> Self {
                Arg::Int(value.code())
            }
        }
    };
}

code_enum! {
    NodeType {
        Junction = 0,
        Reservoir = 1,
        Tank = 2,
    }
}

code_enum! {
    LinkType {
        /// Pipe with a check valve.
        CvPipe = 0,
        Pipe = 1,
        Pump = 2,
        Prv = 3,
        Psv = 4,
        Pbv = 5,
        Fcv = 6,
        Tcv = 7,
        Gpv = 8,
    }
}

code_enum! {
    /// Object kinds counted by `getCount`.
    CountType {
        Node = 0,
        Tank = 1,
        Link = 2,
        Pattern = 3,
        Curve = 4,
        Control = 5,
        Rule = 6,
    }
}

code_enum! {
    NodeProperty {
        Elevation = 0,
        BaseDemand = 1,
        Pattern = 2,
        Emitter = 3,
        InitQuality = 4,
        SourceQuality = 5,
        SourcePattern = 6,
        SourceType = 7,
        TankLevel = 8,
        Demand = 9,
        Head = 10,
        Pressure = 11,
        Quality = 12,
        SourceMass = 13,
        InitVolume = 14,
        MixModel = 15,
        MixZoneVolume = 16,
        TankDiameter = 17,
        MinVolume = 18,
        VolumeCurve = 19,
        MinLevel = 20,
        MaxLevel = 21,
        MixFraction = 22,
        TankKbulk = 23,
        TankVolume = 24,
        MaxVolume = 25,
        CanOverflow = 26,
        DemandDeficit = 27,
    }
}

code_enum! {
    LinkProperty {
        Diameter = 0,
        Length = 1,
        Roughness = 2,
        MinorLoss = 3,
        InitStatus = 4,
        InitSetting = 5,
        Kbulk = 6,
        Kwall = 7,
        Flow = 8,
        Velocity = 9,
        HeadLoss = 10,
        Status = 11,
        Setting = 12,
        Energy = 13,
        Quality = 14,
        Pattern = 15,
        PumpState = 16,
        PumpEfficiency = 17,
        PumpPower = 18,
        PumpHeadCurve = 19,
        PumpEfficiencyCurve = 20,
        PumpEnergyCost = 21,
        PumpEnergyPattern = 22,
    }
}

code_enum! {
    FlowUnits {
        Cfs = 0,
        Gpm = 1,
        Mgd = 2,
        Imgd = 3,
        Afd = 4,
        Lps = 5,
        Lpm = 6,
        Mld = 7,
        Cmh = 8,
        Cmd = 9,
    }
}

code_enum! {
    HeadLossType {
        HazenWilliams = 0,
        DarcyWeisbach = 1,
        ChezyManning = 2,
    }
}

code_enum! {
    /// Flags for `initH`.
    InitHydOption {
        NoSave = 0,
        Save = 1,
        InitFlow = 10,
        SaveAndInit = 11,
    }
}

code_enum! {
    /// What to do with controls that reference a deleted object.
    ActionCode {
        Unconditional = 0,
        Conditional = 1,
    }
}

code_enum! {
    CurveType {
        Volume = 0,
        Pump = 1,
        Efficiency = 2,
        HeadLoss = 3,
        Generic = 4,
    }
}

code_enum! {
    TimeParameter {
        Duration = 0,
        HydraulicStep = 1,
        QualityStep = 2,
        PatternStep = 3,
        PatternStart = 4,
        ReportStep = 5,
        ReportStart = 6,
        RuleStep = 7,
        Statistic = 8,
        Periods = 9,
        StartTime = 10,
        HydraulicTime = 11,
        QualityTime = 12,
        HaltFlag = 13,
        NextEvent = 14,
        NextEventTank = 15,
    }
}

code_enum! {
    SimulationOption {
        Trials = 0,
        Accuracy = 1,
        Tolerance = 2,
        EmitterExponent = 3,
        DemandMultiplier = 4,
        HeadError = 5,
        FlowChange = 6,
        HeadLossForm = 7,
        GlobalEfficiency = 8,
        GlobalPrice = 9,
        GlobalPattern = 10,
        DemandCharge = 11,
        SpecificGravity = 12,
        SpecificViscosity = 13,
        Unbalanced = 14,
        CheckFrequency = 15,
        MaxCheck = 16,
        DampLimit = 17,
        SpecificDiffusivity = 18,
        BulkOrder = 19,
        WallOrder = 20,
        TankOrder = 21,
        ConcentrationLimit = 22,
    }
}

code_enum! {
    QualityType {
        None = 0,
        Chemical = 1,
        Age = 2,
        Trace = 3,
    }
}

code_enum! {
    AnalysisStatistic {
        Iterations = 0,
        RelativeError = 1,
        MaxHeadError = 2,
        MaxFlowChange = 3,
        MassBalance = 4,
        DeficientNodes = 5,
        DemandReduction = 6,
    }
}

code_enum! {
    StatusReport {
        NoReport = 0,
        Normal = 1,
        Full = 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Start and end node indices of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkNodes {
    pub node1: i32,
    pub node2: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

/// A data curve read back in full.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub id: String,
    pub points: Vec<CurvePoint>,
}

/// The three project title lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Title {
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityInfo {
    pub quality_type: QualityType,
    pub chem_name: String,
    pub chem_units: String,
    /// Trace node index, 0 unless the analysis is a source trace.
    pub trace_node: i32,
}

/// Result of `timeToNextEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvent {
    pub event_type: i32,
    pub duration: i64,
    pub element_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_lookup() {
        for kind in LinkType::ALL {
            assert_eq!(LinkType::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(InitHydOption::from_code(11), Some(InitHydOption::SaveAndInit));
        assert_eq!(NodeType::from_code(3), None);
    }

    #[test]
    fn test_enums_convert_to_int_args() {
        assert_eq!(Arg::from(NodeType::Tank), Arg::Int(2));
        assert_eq!(Arg::from(TimeParameter::Duration), Arg::Int(0));
        assert_eq!(Arg::from(NodeProperty::Pressure), Arg::Int(11));
    }
}
