//! Action registry.
//!
//! Every supported action carries its parameter contract as data: the flags
//! it requires and the flags it accepts optionally. Any flag in neither list
//! is forbidden for that action. The usage text is rendered from the same
//! table.

use std::fmt;
use std::fmt::Write as _;

/// Command-line flags understood by the parser.
///
/// Declaration order is the order diagnostics are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// `-zkconnect <zkString>`
    ConnectString,
    /// `-domain <domainName>`
    Domain,
    /// `-instance <instance>`
    Instance,
    /// `-job <jobID>`
    Job,
    /// `-jobGroup <jobGroup>`
    JobGroup,
    /// `-jobName <jobName>`
    JobName,
    /// `-bundle <sab file>`
    Bundle,
    /// `-jobParm <name=value>`, repeatable
    JobParm,
    /// `-force`
    Force,
    /// `-host <hostName>`
    Host,
    /// `-tag <tagName>`
    Tag,
    /// `-adminGroup <adminGroup>`
    AdminGroup,
    /// `-userGroup <userGroup>`
    UserGroup,
    /// `-property <name=value>`, repeatable
    Property,
    /// `-resourceCount <count>`, repeatable
    ResourceCount,
    /// `-resourceTags <tag,tag>`, repeatable
    ResourceTags,
    /// `-resourceExclusive <true|false>`, repeatable
    ResourceExclusive,
    /// `-logFile <logFile>`
    LogFile,
}

/// How a flag consumes the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One value; a repeated flag replaces the earlier value.
    Single,
    /// One value per occurrence, kept in order.
    Repeated,
    /// No value.
    Switch,
    /// One `name=value` per occurrence, collected into a map.
    NameValue,
}

impl Field {
    /// All fields, in reporting order.
    pub const ALL: [Self; 18] = [
        Self::ConnectString,
        Self::Domain,
        Self::Instance,
        Self::Job,
        Self::JobGroup,
        Self::JobName,
        Self::Bundle,
        Self::JobParm,
        Self::Force,
        Self::Host,
        Self::Tag,
        Self::AdminGroup,
        Self::UserGroup,
        Self::Property,
        Self::ResourceCount,
        Self::ResourceTags,
        Self::ResourceExclusive,
        Self::LogFile,
    ];

    /// The flag as typed on the command line.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::ConnectString => "-zkconnect",
            Self::Domain => "-domain",
            Self::Instance => "-instance",
            Self::Job => "-job",
            Self::JobGroup => "-jobGroup",
            Self::JobName => "-jobName",
            Self::Bundle => "-bundle",
            Self::JobParm => "-jobParm",
            Self::Force => "-force",
            Self::Host => "-host",
            Self::Tag => "-tag",
            Self::AdminGroup => "-adminGroup",
            Self::UserGroup => "-userGroup",
            Self::Property => "-property",
            Self::ResourceCount => "-resourceCount",
            Self::ResourceTags => "-resourceTags",
            Self::ResourceExclusive => "-resourceExclusive",
            Self::LogFile => "-logFile",
        }
    }

    /// Look a field up by its flag.
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.flag() == flag)
    }

    /// How the flag consumes arguments.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Force => FieldKind::Switch,
            Self::JobParm => FieldKind::NameValue,
            Self::Property | Self::ResourceCount | Self::ResourceTags | Self::ResourceExclusive => {
                FieldKind::Repeated
            }
            _ => FieldKind::Single,
        }
    }

    /// Placeholder shown after the flag in usage text.
    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::ConnectString => "<zkString>",
            Self::Domain => "<domainName>",
            Self::Instance => "<instance>",
            Self::Job => "<jobID>",
            Self::JobGroup => "<jobGroup>",
            Self::JobName => "<jobName>",
            Self::Bundle => "<sab file>",
            Self::JobParm | Self::Property => "<name=value>",
            Self::Force => "",
            Self::Host => "<hostName>",
            Self::Tag => "<tagName>",
            Self::AdminGroup => "<adminGroup>",
            Self::UserGroup => "<userGroup>",
            Self::ResourceCount => "<resourceCount>",
            Self::ResourceTags => "<resourceTags>",
            Self::ResourceExclusive => "<true|false>",
            Self::LogFile => "<logFile>",
        }
    }

    /// One-line description for usage text.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ConnectString => {
                "coordination string locating the domain's management service. Often stored in the $STREAMS_ZKCONNECT environment variable."
            }
            Self::Domain => "the Streams domain name.",
            Self::Instance => "Streams instance ID.",
            Self::Job => "Streams job ID.",
            Self::JobGroup => "job group used when submitting a job.",
            Self::JobName => "Streams job name. When submitting a job, this value can be \"*DEFAULT\".",
            Self::Bundle => "application bundle file used when submitting a job.",
            Self::JobParm => {
                "job submission parameter of the form \"varName=varValue\". Can be specified multiple times."
            }
            Self::Force => "force the cancel or stop.",
            Self::Host => "host name.",
            Self::Tag => "tag name.",
            Self::AdminGroup => "admin group.",
            Self::UserGroup => "user group.",
            Self::Property => {
                "instance property of the form \"name=value\". Can be specified multiple times."
            }
            Self::ResourceCount => {
                "host count of a resource specification. Repeatable; correlated by position with -resourceTags and -resourceExclusive."
            }
            Self::ResourceTags => {
                "comma separated tags of a resource specification. Repeatable; correlated by position with -resourceCount and -resourceExclusive."
            }
            Self::ResourceExclusive => {
                "whether a resource specification is exclusive. Repeatable; correlated by position with -resourceCount and -resourceTags."
            }
            Self::LogFile => "local file receiving the downloaded log archive.",
        }
    }

    /// Diagnostic for a required field that was not supplied.
    #[must_use]
    pub fn missing_message(self) -> String {
        let name = &self.flag()[1..];
        let article = if name.starts_with(['a', 'e', 'i', 'o', 'u']) {
            "an"
        } else {
            "a"
        };
        format!("Must specify {article} {} value", self.flag())
    }

    /// Diagnostic for a field the action does not accept.
    #[must_use]
    pub fn forbidden_message(self) -> String {
        format!("The {} parameter is not valid for this action.", self.flag())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// Required and optional fields of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Fields that must be present and non-empty.
    pub required: &'static [Field],
    /// Fields that may be present; absent ones get a default.
    pub optional: &'static [Field],
}

impl ParameterSpec {
    /// Whether the field is required.
    #[must_use]
    pub fn is_required(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    /// Whether the field is optional.
    #[must_use]
    pub fn is_optional(&self, field: Field) -> bool {
        self.optional.contains(&field)
    }

    /// Whether the field is forbidden: neither required nor optional.
    #[must_use]
    pub fn is_forbidden(&self, field: Field) -> bool {
        !self.is_required(field) && !self.is_optional(field)
    }
}

use Field::{
    AdminGroup, Bundle, ConnectString, Domain, Force, Host, Instance, Job, JobGroup, JobName, JobParm,
    LogFile, Property, ResourceCount, ResourceExclusive, ResourceTags, Tag, UserGroup,
};

const NONE: &[Field] = &[];
const DOMAIN_ONLY: &[Field] = &[ConnectString, Domain];
const INSTANCE_SCOPE: &[Field] = &[ConnectString, Domain, Instance];
const JOB_SCOPE: &[Field] = &[ConnectString, Domain, Instance, Job];
const HOST_SCOPE: &[Field] = &[ConnectString, Domain, Host];
const TAG_SCOPE: &[Field] = &[ConnectString, Domain, Host, Tag];

static DOMAIN_SPEC: ParameterSpec = ParameterSpec {
    required: DOMAIN_ONLY,
    optional: NONE,
};
static INSTANCE_SPEC: ParameterSpec = ParameterSpec {
    required: INSTANCE_SCOPE,
    optional: NONE,
};
static JOB_SPEC: ParameterSpec = ParameterSpec {
    required: JOB_SCOPE,
    optional: NONE,
};
static JOB_BY_NAME_SPEC: ParameterSpec = ParameterSpec {
    required: &[ConnectString, Domain, Instance, JobName],
    optional: NONE,
};
static SUBMIT_JOB_SPEC: ParameterSpec = ParameterSpec {
    required: &[ConnectString, Domain, Instance, Bundle],
    optional: &[JobGroup, JobName, JobParm],
};
static CANCEL_JOB_SPEC: ParameterSpec = ParameterSpec {
    required: JOB_SCOPE,
    optional: &[Force],
};
static HOST_SPEC: ParameterSpec = ParameterSpec {
    required: HOST_SCOPE,
    optional: NONE,
};
static TAG_SPEC: ParameterSpec = ParameterSpec {
    required: TAG_SCOPE,
    optional: NONE,
};
static MAKE_INSTANCE_SPEC: ParameterSpec = ParameterSpec {
    required: INSTANCE_SCOPE,
    optional: &[
        AdminGroup,
        UserGroup,
        Property,
        ResourceCount,
        ResourceTags,
        ResourceExclusive,
    ],
};
static STOP_INSTANCE_SPEC: ParameterSpec = ParameterSpec {
    required: INSTANCE_SCOPE,
    optional: &[Force],
};
static JOB_LOGS_SPEC: ParameterSpec = ParameterSpec {
    required: &[ConnectString, Domain, Instance, Job, LogFile],
    optional: NONE,
};
static DOMAIN_LOGS_SPEC: ParameterSpec = ParameterSpec {
    required: &[ConnectString, Domain, LogFile],
    optional: NONE,
};

/// A supported action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Domain status and instances.
    GetDomainInfo,
    /// Domain and instance status.
    GetInstanceInfo,
    /// Domain, instance and one job.
    GetSingleJobInfo,
    /// Domain, instance and every job.
    GetAllJobInfo,
    /// Domain, instance and the first job with a given name.
    GetSingleJobInfoByName,
    /// Deploy a bundle and submit it.
    SubmitJob,
    /// Cancel a job.
    CancelJob,
    /// Add a host to the domain.
    AddDomainHost,
    /// Remove a host from the domain.
    RemoveDomainHost,
    /// List the domain's hosts.
    GetDomainHosts,
    /// Tag a host.
    AddTagToHost,
    /// Untag a host.
    RemoveTagFromHost,
    /// List a host's tags.
    GetHostTags,
    /// Create an instance.
    MakeInstance,
    /// Remove an instance.
    RemoveInstance,
    /// Start an instance.
    StartInstance,
    /// Stop an instance.
    StopInstance,
    /// Download a job's log archive.
    GetJobLogs,
    /// Download the domain's log archive.
    GetDomainLogs,
}

impl Action {
    /// All actions, in usage order.
    pub const ALL: [Self; 19] = [
        Self::GetDomainInfo,
        Self::GetInstanceInfo,
        Self::GetSingleJobInfo,
        Self::GetAllJobInfo,
        Self::GetSingleJobInfoByName,
        Self::SubmitJob,
        Self::CancelJob,
        Self::AddDomainHost,
        Self::RemoveDomainHost,
        Self::GetDomainHosts,
        Self::AddTagToHost,
        Self::RemoveTagFromHost,
        Self::GetHostTags,
        Self::MakeInstance,
        Self::RemoveInstance,
        Self::StartInstance,
        Self::StopInstance,
        Self::GetJobLogs,
        Self::GetDomainLogs,
    ];

    /// Action name as typed on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetDomainInfo => "getDomainInfo",
            Self::GetInstanceInfo => "getInstanceInfo",
            Self::GetSingleJobInfo => "getSingleJobInfo",
            Self::GetAllJobInfo => "getAllJobInfo",
            Self::GetSingleJobInfoByName => "getSingleJobInfoByName",
            Self::SubmitJob => "submitJob",
            Self::CancelJob => "cancelJob",
            Self::AddDomainHost => "addDomainHost",
            Self::RemoveDomainHost => "removeDomainHost",
            Self::GetDomainHosts => "getDomainHosts",
            Self::AddTagToHost => "addTagToHost",
            Self::RemoveTagFromHost => "removeTagFromHost",
            Self::GetHostTags => "getHostTags",
            Self::MakeInstance => "makeInstance",
            Self::RemoveInstance => "removeInstance",
            Self::StartInstance => "startInstance",
            Self::StopInstance => "stopInstance",
            Self::GetJobLogs => "getJobLogs",
            Self::GetDomainLogs => "getDomainLogs",
        }
    }

    /// Look an action up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// The action's parameter contract.
    #[must_use]
    pub fn spec(self) -> &'static ParameterSpec {
        match self {
            Self::GetDomainInfo | Self::GetDomainHosts => &DOMAIN_SPEC,
            Self::GetInstanceInfo
            | Self::GetAllJobInfo
            | Self::RemoveInstance
            | Self::StartInstance => &INSTANCE_SPEC,
            Self::GetSingleJobInfo => &JOB_SPEC,
            Self::GetSingleJobInfoByName => &JOB_BY_NAME_SPEC,
            Self::SubmitJob => &SUBMIT_JOB_SPEC,
            Self::CancelJob => &CANCEL_JOB_SPEC,
            Self::AddDomainHost | Self::RemoveDomainHost | Self::GetHostTags => &HOST_SPEC,
            Self::AddTagToHost | Self::RemoveTagFromHost => &TAG_SPEC,
            Self::MakeInstance => &MAKE_INSTANCE_SPEC,
            Self::StopInstance => &STOP_INSTANCE_SPEC,
            Self::GetJobLogs => &JOB_LOGS_SPEC,
            Self::GetDomainLogs => &DOMAIN_LOGS_SPEC,
        }
    }

    /// Whether the action only reads state and prints a document.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            Self::GetDomainInfo
                | Self::GetInstanceInfo
                | Self::GetSingleJobInfo
                | Self::GetAllJobInfo
                | Self::GetSingleJobInfoByName
                | Self::GetDomainHosts
                | Self::GetHostTags
        )
    }

    /// Synopsis line for this action.
    #[must_use]
    pub fn synopsis(self, program: &str) -> String {
        let spec = self.spec();
        let mut line = format!("{program} {}", self.name());
        for field in spec.required {
            let _ = write!(line, " {}", flag_text(*field));
        }
        for field in spec.optional {
            let repeat = matches!(field.kind(), FieldKind::Repeated | FieldKind::NameValue);
            let _ = write!(
                line,
                " [{}{}]",
                flag_text(*field),
                if repeat { "..." } else { "" }
            );
        }
        line
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn flag_text(field: Field) -> String {
    if field.placeholder().is_empty() {
        field.flag().to_string()
    } else {
        format!("{} {}", field.flag(), field.placeholder())
    }
}

/// Full usage text: one synopsis per action, then every flag.
#[must_use]
pub fn usage(program: &str) -> String {
    let mut text = String::new();
    for (i, action) in Action::ALL.into_iter().enumerate() {
        if i > 0 {
            text.push_str("   or\n");
        }
        let _ = writeln!(text, "{}", action.synopsis(program));
    }
    text.push('\n');
    text.push_str("where:\n");
    for field in Field::ALL {
        let _ = writeln!(text, "  {} : {}", flag_text(field), field.description());
    }
    text
}
