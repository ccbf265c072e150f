// ── REST-to-domain type conversions ──
//
// Bridges raw iControl item shapes into canonical `bigsync_core::model`
// types and back. The device speaks in presence pairs (`enabled`/`disabled`),
// joined strings (`"/Common/a and /Common/b"`), and flag structs; the domain
// speaks in enums and vectors. Read conversions are fallible: a device
// payload the domain cannot represent must fail the read, not silently
// shrink the inventory.

use serde::{Deserialize, Serialize};

use crate::model::{
    AdminState, AppService, ArpEntry, DEFAULT_INTERVAL, DEFAULT_TIMEOUT, DataGroupRecord,
    DataGroupType, FdbRecord, FdbTunnel, IAppTable, IAppVariable, IRule, InternalDataGroup,
    IpProtocol, L7Action, L7Condition, L7Match, L7Operand, L7Policy, L7Rule, LbMode, MacAddress,
    Monitor, MonitorType, Node, NodeAdminState, Pool, PoolMember, SourceAddressTranslation,
    VirtualAddress, VirtualServer,
};

// ── Helpers ────────────────────────────────────────────────────────

const SESSION_ENABLED: &str = "user-enabled";
const SESSION_DISABLED: &str = "user-disabled";
const STATE_UP: &str = "user-up";
const STATE_DOWN: &str = "user-down";

fn compose_path(partition: Option<&str>, name: &str) -> String {
    if name.starts_with('/') {
        name.to_owned()
    } else {
        format!("/{}/{}", partition.unwrap_or("Common"), name)
    }
}

/// The device reports one joined string for a pool's monitors.
fn split_monitors(raw: Option<&str>) -> Vec<String> {
    raw.map(|joined| {
        joined
            .split(" and ")
            .map(str::trim)
            .filter(|part| !part.is_empty() && *part != "none")
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

fn join_monitors(monitors: &[String]) -> String {
    if monitors.is_empty() {
        // `none` detaches every monitor; an empty string is rejected.
        "none".to_owned()
    } else {
        monitors.join(" and ")
    }
}

fn member_admin_state(session: Option<&str>, state: Option<&str>) -> AdminState {
    match (session, state) {
        (Some(SESSION_DISABLED), Some(STATE_DOWN)) => AdminState::ForcedOffline,
        (Some(SESSION_DISABLED), _) => AdminState::Disabled,
        _ => AdminState::Enabled,
    }
}

fn member_session_state(admin_state: AdminState) -> (&'static str, &'static str) {
    match admin_state {
        AdminState::Enabled => (SESSION_ENABLED, STATE_UP),
        AdminState::Disabled => (SESSION_DISABLED, STATE_UP),
        AdminState::ForcedOffline => (SESSION_DISABLED, STATE_DOWN),
    }
}

/// Member names encode the port: `addr:port`, or `addr.port` when the
/// address itself contains colons.
fn member_address_and_port(name: &str) -> Result<(String, u16), String> {
    let separator = if name.contains(':') && name.matches(':').count() > 1 {
        '.'
    } else {
        ':'
    };
    let (address, port) = name
        .rsplit_once(separator)
        .ok_or_else(|| format!("member `{name}` has no port suffix"))?;
    let port = port
        .parse()
        .map_err(|_| format!("member `{name}` has an unparseable port"))?;
    Ok((address.to_owned(), port))
}

// ── Monitors ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MonitorItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv: Option<String>,
}

impl MonitorItem {
    /// The collection the item came from names the probe type; the item
    /// itself does not carry it.
    pub(super) fn into_monitor(self, monitor_type: MonitorType) -> Monitor {
        // Older firmware reports unset payloads as the literal "none".
        let scrub = |value: Option<String>| value.filter(|v| v != "none");
        Monitor {
            name: self.name,
            partition: self.partition.unwrap_or_default(),
            monitor_type,
            interval: self.interval.unwrap_or(DEFAULT_INTERVAL),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            send: scrub(self.send),
            recv: scrub(self.recv),
        }
        .lenient()
    }
}

impl From<&Monitor> for MonitorItem {
    fn from(monitor: &Monitor) -> Self {
        Self {
            name: monitor.name.clone(),
            partition: Some(monitor.partition.clone()),
            interval: Some(monitor.interval),
            timeout: Some(monitor.timeout),
            send: monitor.send.clone(),
            recv: monitor.recv.clone(),
        }
    }
}

// ── Nodes ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NodeItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    // Read-only monitor verdict; never written back.
    #[serde(default, skip_serializing)]
    pub state: Option<String>,
}

impl From<NodeItem> for Node {
    fn from(item: NodeItem) -> Self {
        // Only the session distinguishes operator intent; `state` also
        // moves with monitor verdicts and would make the diff thrash.
        let admin_state = match item.session.as_deref() {
            Some(SESSION_DISABLED) => NodeAdminState::Disabled,
            _ => NodeAdminState::Enabled,
        };
        Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            address: item.address,
            admin_state,
        }
    }
}

impl From<&Node> for NodeItem {
    fn from(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            partition: Some(node.partition.clone()),
            address: node.address.clone(),
            session: Some(node_session(node.admin_state).to_owned()),
            state: None,
        }
    }
}

pub(super) fn node_session(admin_state: NodeAdminState) -> &'static str {
    match admin_state {
        NodeAdminState::Enabled => SESSION_ENABLED,
        NodeAdminState::Disabled => SESSION_DISABLED,
    }
}

/// Body for the state-only node update.
#[derive(Debug, Serialize)]
pub(super) struct NodeSessionPatch {
    pub session: &'static str,
}

impl From<&Node> for NodeSessionPatch {
    fn from(node: &Node) -> Self {
        Self {
            session: node_session(node.admin_state),
        }
    }
}

// ── Pools ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MemberItem {
    pub name: String,
    #[serde(default, skip_serializing)]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MembersReference {
    #[serde(default)]
    pub items: Vec<MemberItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PoolItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancing_mode: Option<LbMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<String>,
    /// Write-side member list; a replace swaps the whole collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberItem>>,
    /// Read-side member subcollection, present when expanded.
    #[serde(default, skip_serializing)]
    pub members_reference: Option<MembersReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<MemberItem> for PoolMember {
    type Error = String;

    fn try_from(item: MemberItem) -> Result<Self, String> {
        let (derived_address, port) = member_address_and_port(&item.name)?;
        let admin_state = member_admin_state(item.session.as_deref(), item.state.as_deref());
        Ok(Self {
            name: item.name,
            address: item.address.unwrap_or(derived_address),
            port,
            admin_state,
            ratio: item.ratio.unwrap_or(1),
            connection_limit: item.connection_limit.unwrap_or(0),
        })
    }
}

impl From<&PoolMember> for MemberItem {
    fn from(member: &PoolMember) -> Self {
        let (session, state) = member_session_state(member.admin_state);
        Self {
            name: PoolMember::member_name(&member.address, member.port),
            address: None,
            session: Some(session.to_owned()),
            state: Some(state.to_owned()),
            ratio: Some(member.ratio),
            connection_limit: Some(member.connection_limit),
        }
    }
}

impl TryFrom<PoolItem> for Pool {
    type Error = String;

    fn try_from(item: PoolItem) -> Result<Self, String> {
        let members = item
            .members_reference
            .map(|reference| reference.items)
            .unwrap_or_default()
            .into_iter()
            .map(PoolMember::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut pool = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            load_balancing_mode: item.load_balancing_mode.unwrap_or_default(),
            monitors: split_monitors(item.monitor.as_deref()),
            members,
            description: item.description,
        };
        pool.normalize();
        Ok(pool)
    }
}

impl From<&Pool> for PoolItem {
    fn from(pool: &Pool) -> Self {
        Self {
            name: pool.name.clone(),
            partition: Some(pool.partition.clone()),
            load_balancing_mode: Some(pool.load_balancing_mode),
            monitor: Some(join_monitors(&pool.monitors)),
            members: Some(pool.members.iter().map(MemberItem::from).collect()),
            members_reference: None,
            description: pool.description.clone(),
        }
    }
}

// ── L7 policies ────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ConditionItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_uri: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_cookie: Option<bool>,
    /// Header or cookie name for the operands that need one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_with: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_with: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ActionItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ConditionsReference {
    #[serde(default)]
    pub items: Vec<ConditionItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActionsReference {
    #[serde(default)]
    pub items: Vec<ActionItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PolicyRuleItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<ConditionItem>>,
    #[serde(default, skip_serializing)]
    pub conditions_reference: Option<ConditionsReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionItem>>,
    #[serde(default, skip_serializing)]
    pub actions_reference: Option<ActionsReference>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RulesReference {
    #[serde(default)]
    pub items: Vec<PolicyRuleItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PolicyItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<String>>,
    /// Published (non-draft) policy; required for direct writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<PolicyRuleItem>>,
    #[serde(default, skip_serializing)]
    pub rules_reference: Option<RulesReference>,
}

impl TryFrom<ConditionItem> for L7Condition {
    type Error = String;

    fn try_from(item: ConditionItem) -> Result<Self, String> {
        let flag = |value: Option<bool>| value.unwrap_or(false);
        let named = |value: Option<String>, what: &str| {
            value.ok_or_else(|| format!("{what} condition is missing tmName"))
        };
        let operand = if flag(item.http_host) {
            L7Operand::HttpHost
        } else if flag(item.http_uri) {
            L7Operand::HttpUri
        } else if flag(item.http_header) {
            L7Operand::HttpHeader {
                header: named(item.tm_name, "httpHeader")?,
            }
        } else if flag(item.http_cookie) {
            L7Operand::HttpCookie {
                cookie: named(item.tm_name, "httpCookie")?,
            }
        } else {
            return Err(format!("condition `{}` has an unsupported operand", item.name));
        };
        let matcher = if flag(item.starts_with) {
            L7Match::StartsWith
        } else if flag(item.ends_with) {
            L7Match::EndsWith
        } else if flag(item.contains) {
            L7Match::Contains
        } else {
            // The device omits every matcher flag for plain equality.
            L7Match::Equals
        };
        Ok(Self {
            operand,
            matcher,
            values: item.values.unwrap_or_default(),
        })
    }
}

fn condition_item(index: usize, condition: &L7Condition) -> ConditionItem {
    let mut item = ConditionItem {
        name: index.to_string(),
        request: Some(true),
        values: Some(condition.values.clone()),
        ..ConditionItem::default()
    };
    match &condition.operand {
        L7Operand::HttpHost => item.http_host = Some(true),
        L7Operand::HttpUri => item.http_uri = Some(true),
        L7Operand::HttpHeader { header } => {
            item.http_header = Some(true);
            item.tm_name = Some(header.clone());
        }
        L7Operand::HttpCookie { cookie } => {
            item.http_cookie = Some(true);
            item.tm_name = Some(cookie.clone());
        }
    }
    match condition.matcher {
        L7Match::Equals => item.equals = Some(true),
        L7Match::StartsWith => item.starts_with = Some(true),
        L7Match::EndsWith => item.ends_with = Some(true),
        L7Match::Contains => item.contains = Some(true),
    }
    item
}

impl TryFrom<ActionItem> for L7Action {
    type Error = String;

    fn try_from(item: ActionItem) -> Result<Self, String> {
        let flag = |value: Option<bool>| value.unwrap_or(false);
        if flag(item.forward) {
            Ok(Self::Forward {
                pool: item
                    .pool
                    .ok_or_else(|| format!("forward action `{}` has no pool", item.name))?,
            })
        } else if flag(item.redirect) {
            Ok(Self::Redirect {
                location: item
                    .location
                    .ok_or_else(|| format!("redirect action `{}` has no location", item.name))?,
            })
        } else if flag(item.reset) {
            Ok(Self::Reset)
        } else {
            Err(format!("action `{}` has an unsupported verb", item.name))
        }
    }
}

fn action_item(index: usize, action: &L7Action) -> ActionItem {
    let mut item = ActionItem {
        name: index.to_string(),
        request: Some(true),
        ..ActionItem::default()
    };
    match action {
        L7Action::Forward { pool } => {
            item.forward = Some(true);
            item.pool = Some(pool.clone());
        }
        L7Action::Redirect { location } => {
            item.redirect = Some(true);
            item.location = Some(location.clone());
        }
        L7Action::Reset => item.reset = Some(true),
    }
    item
}

impl TryFrom<PolicyRuleItem> for L7Rule {
    type Error = String;

    fn try_from(item: PolicyRuleItem) -> Result<Self, String> {
        let conditions = item
            .conditions_reference
            .map(|reference| reference.items)
            .or(item.conditions)
            .unwrap_or_default()
            .into_iter()
            .map(L7Condition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let actions = item
            .actions_reference
            .map(|reference| reference.items)
            .or(item.actions)
            .unwrap_or_default()
            .into_iter()
            .map(L7Action::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: item.name,
            ordinal: item.ordinal.unwrap_or(0),
            conditions,
            actions,
        })
    }
}

fn policy_rule_item(rule: &L7Rule) -> PolicyRuleItem {
    PolicyRuleItem {
        name: rule.name.clone(),
        ordinal: Some(rule.ordinal),
        conditions: Some(
            rule.conditions
                .iter()
                .enumerate()
                .map(|(index, condition)| condition_item(index, condition))
                .collect(),
        ),
        conditions_reference: None,
        actions: Some(
            rule.actions
                .iter()
                .enumerate()
                .map(|(index, action)| action_item(index, action))
                .collect(),
        ),
        actions_reference: None,
    }
}

impl TryFrom<PolicyItem> for L7Policy {
    type Error = String;

    fn try_from(item: PolicyItem) -> Result<Self, String> {
        let rules = item
            .rules_reference
            .map(|reference| reference.items)
            .or(item.rules)
            .unwrap_or_default()
            .into_iter()
            .map(L7Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut policy = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            strategy: item.strategy.unwrap_or_else(|| "/Common/first-match".to_owned()),
            controls: item.controls.unwrap_or_default(),
            requires: item.requires.unwrap_or_default(),
            rules,
        };
        policy.normalize();
        Ok(policy)
    }
}

impl From<&L7Policy> for PolicyItem {
    fn from(policy: &L7Policy) -> Self {
        Self {
            name: policy.name.clone(),
            partition: Some(policy.partition.clone()),
            strategy: Some(policy.strategy.clone()),
            controls: Some(policy.controls.clone()),
            requires: Some(policy.requires.clone()),
            legacy: Some(true),
            rules: Some(policy.rules.iter().map(policy_rule_item).collect()),
            rules_reference: None,
        }
    }
}

// ── iRules ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RuleItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_anonymous: Option<String>,
}

impl From<RuleItem> for IRule {
    fn from(item: RuleItem) -> Self {
        Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            definition: item.api_anonymous.unwrap_or_default(),
        }
    }
}

impl From<&IRule> for RuleItem {
    fn from(irule: &IRule) -> Self {
        Self {
            name: irule.name.clone(),
            partition: Some(irule.partition.clone()),
            api_anonymous: Some(irule.definition.clone()),
        }
    }
}

// ── Virtual addresses ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VirtualAddressItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    pub address: String,
    /// `"yes"` / `"no"` on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,
    /// `"enabled"` / `"disabled"` on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_group: Option<String>,
    /// Managed addresses must outlive the virtuals pointing at them; the
    /// delete phase is the only authority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<String>,
}

impl From<VirtualAddressItem> for VirtualAddress {
    fn from(item: VirtualAddressItem) -> Self {
        Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            address: item.address,
            enabled: item.enabled.as_deref() != Some("no"),
            arp: item.arp.as_deref() != Some("disabled"),
            traffic_group: item.traffic_group,
        }
    }
}

impl From<&VirtualAddress> for VirtualAddressItem {
    fn from(address: &VirtualAddress) -> Self {
        Self {
            name: address.name.clone(),
            partition: Some(address.partition.clone()),
            address: address.address.clone(),
            enabled: Some(if address.enabled { "yes" } else { "no" }.to_owned()),
            arp: Some(if address.arp { "enabled" } else { "disabled" }.to_owned()),
            traffic_group: address.traffic_group.clone(),
            auto_delete: Some("false".to_owned()),
        }
    }
}

// ── Virtual servers ────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ItemRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubItem {
    pub name: String,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
}

impl SubItem {
    fn path(&self) -> String {
        self.full_path
            .clone()
            .unwrap_or_else(|| compose_path(self.partition.as_deref(), &self.name))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SubItems {
    #[serde(default)]
    pub items: Vec<SubItem>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SatItem {
    #[serde(rename = "type")]
    pub sat_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VirtualItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_protocol: Option<IpProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Always present on writes; an empty string detaches the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<ItemRef>>,
    #[serde(default, skip_serializing)]
    pub profiles_reference: Option<SubItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<ItemRef>>,
    #[serde(default, skip_serializing)]
    pub policies_reference: Option<SubItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlans: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlans_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlans_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address_translation: Option<SatItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<VirtualItem> for VirtualServer {
    type Error = String;

    fn try_from(item: VirtualItem) -> Result<Self, String> {
        let source_address_translation = match item.source_address_translation {
            None => SourceAddressTranslation::None,
            Some(sat) => match sat.sat_type.as_str() {
                "none" => SourceAddressTranslation::None,
                "automap" => SourceAddressTranslation::Automap,
                "snat" => SourceAddressTranslation::Snat {
                    pool: sat
                        .pool
                        .ok_or_else(|| format!("virtual `{}` has a snat with no pool", item.name))?,
                },
                other => {
                    return Err(format!(
                        "virtual `{}` has an unsupported snat type `{other}`",
                        item.name
                    ));
                }
            },
        };
        let profiles = item
            .profiles_reference
            .map(|reference| reference.items.iter().map(SubItem::path).collect())
            .unwrap_or_default();
        let policies = item
            .policies_reference
            .map(|reference| reference.items.iter().map(SubItem::path).collect())
            .unwrap_or_default();
        let mut server = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            destination: item.destination,
            source: item.source.unwrap_or_else(|| "0.0.0.0/0".to_owned()),
            ip_protocol: item.ip_protocol.unwrap_or_default(),
            enabled: item.disabled != Some(true),
            pool: item.pool.filter(|pool| !pool.is_empty()),
            profiles,
            policies,
            rules: item.rules.unwrap_or_default(),
            vlans: item.vlans.unwrap_or_default(),
            vlans_enabled: item.vlans_enabled.unwrap_or(false),
            source_address_translation,
            description: item.description,
        };
        server.normalize();
        Ok(server)
    }
}

impl From<&VirtualServer> for VirtualItem {
    fn from(server: &VirtualServer) -> Self {
        let refs = |paths: &[String]| {
            Some(
                paths
                    .iter()
                    .map(|path| ItemRef { name: path.clone() })
                    .collect(),
            )
        };
        let sat = match &server.source_address_translation {
            SourceAddressTranslation::None => SatItem {
                sat_type: "none".to_owned(),
                pool: None,
            },
            SourceAddressTranslation::Automap => SatItem {
                sat_type: "automap".to_owned(),
                pool: None,
            },
            SourceAddressTranslation::Snat { pool } => SatItem {
                sat_type: "snat".to_owned(),
                pool: Some(pool.clone()),
            },
        };
        Self {
            name: server.name.clone(),
            partition: Some(server.partition.clone()),
            destination: server.destination.clone(),
            source: Some(server.source.clone()),
            ip_protocol: Some(server.ip_protocol),
            enabled: server.enabled.then_some(true),
            disabled: (!server.enabled).then_some(true),
            pool: Some(server.pool.clone().unwrap_or_default()),
            profiles: refs(&server.profiles),
            profiles_reference: None,
            policies: refs(&server.policies),
            policies_reference: None,
            rules: Some(server.rules.clone()),
            vlans: Some(server.vlans.clone()),
            vlans_enabled: server.vlans_enabled.then_some(true),
            vlans_disabled: (!server.vlans_enabled).then_some(true),
            source_address_translation: Some(sat),
            description: server.description.clone(),
        }
    }
}

// ── Application services ───────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VariableItem {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TableRowItem {
    #[serde(default)]
    pub row: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TableItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<TableRowItem>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AppServiceItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableItem>>,
    /// `"definition"` forces a template re-run on update; never read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_action: Option<String>,
}

impl TryFrom<AppServiceItem> for AppService {
    type Error = String;

    fn try_from(item: AppServiceItem) -> Result<Self, String> {
        let template = item
            .template
            .ok_or_else(|| format!("application service `{}` has no template", item.name))?;
        let tables = item
            .tables
            .unwrap_or_default()
            .into_iter()
            .map(|table| IAppTable {
                name: table.name,
                column_names: table.column_names.unwrap_or_default(),
                rows: table
                    .rows
                    .unwrap_or_default()
                    .into_iter()
                    .map(|row| row.row)
                    .collect(),
            })
            .collect();
        let mut service = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            template,
            variables: item
                .variables
                .unwrap_or_default()
                .into_iter()
                .map(|variable| IAppVariable {
                    name: variable.name,
                    value: variable.value,
                })
                .collect(),
            tables,
        };
        service.normalize();
        Ok(service)
    }
}

impl From<&AppService> for AppServiceItem {
    fn from(service: &AppService) -> Self {
        Self {
            name: service.name.clone(),
            partition: Some(service.partition.clone()),
            template: Some(service.template.clone()),
            variables: Some(
                service
                    .variables
                    .iter()
                    .map(|variable| VariableItem {
                        name: variable.name.clone(),
                        value: variable.value.clone(),
                    })
                    .collect(),
            ),
            tables: Some(
                service
                    .tables
                    .iter()
                    .map(|table| TableItem {
                        name: table.name.clone(),
                        column_names: Some(table.column_names.clone()),
                        rows: Some(
                            table
                                .rows
                                .iter()
                                .map(|row| TableRowItem { row: row.clone() })
                                .collect(),
                        ),
                    })
                    .collect(),
            ),
            execute_action: None,
        }
    }
}

// ── Internal data groups ───────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DataGroupRecordItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DataGroupItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(rename = "type")]
    pub dg_type: DataGroupType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<DataGroupRecordItem>>,
}

impl From<DataGroupItem> for InternalDataGroup {
    fn from(item: DataGroupItem) -> Self {
        let mut group = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            dg_type: item.dg_type,
            records: item
                .records
                .unwrap_or_default()
                .into_iter()
                .map(|record| DataGroupRecord {
                    name: record.name,
                    data: record.data.unwrap_or_default(),
                })
                .collect(),
        };
        group.normalize();
        group
    }
}

impl From<&InternalDataGroup> for DataGroupItem {
    fn from(group: &InternalDataGroup) -> Self {
        Self {
            name: group.name.clone(),
            partition: Some(group.partition.clone()),
            dg_type: group.dg_type,
            records: Some(
                group
                    .records
                    .iter()
                    .map(|record| DataGroupRecordItem {
                        name: record.name.clone(),
                        data: Some(record.data.clone()),
                    })
                    .collect(),
            ),
        }
    }
}

// ── ARP entries ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ArpItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    pub ip_address: String,
    pub mac_address: String,
}

impl TryFrom<ArpItem> for ArpEntry {
    type Error = String;

    fn try_from(item: ArpItem) -> Result<Self, String> {
        let mac_address: MacAddress = item
            .mac_address
            .parse()
            .map_err(|_| format!("arp `{}` has an invalid MAC `{}`", item.name, item.mac_address))?;
        Ok(Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            ip_address: item.ip_address,
            mac_address,
        })
    }
}

impl From<&ArpEntry> for ArpItem {
    fn from(entry: &ArpEntry) -> Self {
        Self {
            name: entry.name.clone(),
            partition: Some(entry.partition.clone()),
            ip_address: entry.ip_address.clone(),
            mac_address: entry.mac_address.to_string(),
        }
    }
}

// ── FDB tunnel records ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FdbRecordItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FdbTunnelItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<FdbRecordItem>>,
}

impl TryFrom<FdbTunnelItem> for FdbTunnel {
    type Error = String;

    fn try_from(item: FdbTunnelItem) -> Result<Self, String> {
        let records = item
            .records
            .unwrap_or_default()
            .into_iter()
            .map(|record| {
                let name: MacAddress = record.name.parse().map_err(|_| {
                    format!("tunnel `{}` has a record with invalid MAC `{}`", item.name, record.name)
                })?;
                Ok(FdbRecord {
                    name,
                    endpoint: record.endpoint.unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let mut tunnel = Self {
            name: item.name,
            partition: item.partition.unwrap_or_default(),
            records,
        };
        tunnel.normalize();
        Ok(tunnel)
    }
}

impl From<&FdbTunnel> for FdbTunnelItem {
    fn from(tunnel: &FdbTunnel) -> Self {
        Self {
            name: tunnel.name.clone(),
            partition: Some(tunnel.partition.clone()),
            records: Some(
                tunnel
                    .records
                    .iter()
                    .map(|record| FdbRecordItem {
                        name: record.name.to_string(),
                        endpoint: Some(record.endpoint.clone()),
                    })
                    .collect(),
            ),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
