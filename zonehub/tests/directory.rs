//! Directory scenarios over injected fakes: no sockets, no HTTP.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::rc::Rc;

use rstest::rstest;
use zonehub::{ActionInvoker, Error, InvokeError, Network};
use zonehub_discovery::{
    DeviceDescription, DeviceProber, DeviceProvider, DiscoveryError,
};
use zonehub_topology::{GroupId, TopologyError, TopologySource};

const KITCHEN: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
const DINING: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 6);
const OFFICE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 7);

struct FakeProvider {
    addresses: BTreeSet<Ipv4Addr>,
    clears: Rc<Cell<usize>>,
}

impl DeviceProvider for FakeProvider {
    fn addresses(&mut self) -> zonehub_discovery::Result<BTreeSet<Ipv4Addr>> {
        Ok(self.addresses.clone())
    }

    fn clear(&mut self) {
        self.clears.set(self.clears.get() + 1);
    }
}

struct FakeProber;

impl DeviceProber for FakeProber {
    fn describe(&self, address: Ipv4Addr) -> zonehub_discovery::Result<DeviceDescription> {
        let xml = format!(
            r#"<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:ZonePlayer:1</deviceType>
    <friendlyName>{address} - Play:1</friendlyName>
    <modelName>Play:1</modelName>
    <modelNumber>S1</modelNumber>
    <UDN>uuid:RINCON_{address}</UDN>
  </device>
</root>"#
        );
        DeviceDescription::from_xml(&xml)
    }
}

/// Canned topology: Kitchen leads Dining Room in group G1, Office plays alone.
const TOPOLOGY_XML: &str = "<ZPSupportInfo><ZonePlayers>\
    <ZonePlayer group='RINCON_A:12' coordinator='true' \
     location='http://10.0.0.5:1400/xml/device_description.xml' \
     uuid='RINCON_A'>Kitchen</ZonePlayer>\
    <ZonePlayer group='RINCON_A:12' coordinator='false' \
     location='http://10.0.0.6:1400/xml/device_description.xml' \
     uuid='RINCON_B'>Dining Room</ZonePlayer>\
    <ZonePlayer group='RINCON_C:3' coordinator='true' \
     location='http://10.0.0.7:1400/xml/device_description.xml' \
     uuid='RINCON_C'>Office</ZonePlayer>\
    </ZonePlayers></ZPSupportInfo>";

struct CountingSource {
    xml: String,
    fetches: Rc<RefCell<Vec<Ipv4Addr>>>,
}

impl TopologySource for CountingSource {
    fn fetch(&self, address: Ipv4Addr) -> zonehub_topology::Result<String> {
        self.fetches.borrow_mut().push(address);
        Ok(self.xml.clone())
    }
}

struct Fixture {
    network: Network,
    fetches: Rc<RefCell<Vec<Ipv4Addr>>>,
    clears: Rc<Cell<usize>>,
}

fn fixture_with(addresses: BTreeSet<Ipv4Addr>) -> Fixture {
    let fetches = Rc::new(RefCell::new(Vec::new()));
    let clears = Rc::new(Cell::new(0));
    let network = Network::builder()
        .provider(Box::new(FakeProvider {
            addresses,
            clears: clears.clone(),
        }))
        .prober(Box::new(FakeProber))
        .source(Box::new(CountingSource {
            xml: TOPOLOGY_XML.to_string(),
            fetches: fetches.clone(),
        }))
        .build()
        .unwrap();
    Fixture {
        network,
        fetches,
        clears,
    }
}

fn fixture() -> Fixture {
    fixture_with(BTreeSet::from([KITCHEN, DINING, OFFICE]))
}

#[test]
fn one_controller_per_group_coordinators_only() {
    let mut fx = fixture();
    let controllers = fx.network.controllers().unwrap();

    assert_eq!(controllers.len(), 2);
    assert_eq!(controllers[0].address, KITCHEN);
    assert_eq!(controllers[0].room, "Kitchen");
    assert_eq!(controllers[1].address, OFFICE);
}

#[test]
fn follower_room_maps_to_its_group_coordinator() {
    let mut fx = fixture();
    let controller = fx.network.controller_by_room("Dining Room").unwrap().unwrap();

    assert_eq!(controller.address, KITCHEN);
    assert_eq!(controller.room, "Kitchen");
    assert_eq!(controller.group, GroupId::new("RINCON_A:12"));
}

#[rstest]
#[case::exact("Kitchen", KITCHEN)]
#[case::case_insensitive("kitchen", KITCHEN)]
#[case::follower_case_insensitive("DINING ROOM", KITCHEN)]
#[case::singleton("Office", OFFICE)]
fn room_lookup_tolerates_case(#[case] room: &str, #[case] expected: Ipv4Addr) {
    let mut fx = fixture();
    let controller = fx.network.controller_by_room(room).unwrap().unwrap();
    assert_eq!(controller.address, expected);
}

#[test]
fn unknown_room_is_none() {
    let mut fx = fixture();
    assert!(fx.network.controller_by_room("Garage").unwrap().is_none());
}

#[test]
fn address_lookup_is_exact() {
    let mut fx = fixture();
    let controller = fx.network.controller_by_ip(DINING).unwrap();
    assert_eq!(controller.address, KITCHEN);

    let unknown = Ipv4Addr::new(10, 0, 0, 99);
    let result = fx.network.controller_by_ip(unknown);
    assert!(matches!(result, Err(Error::UnknownAddress(a)) if a == unknown));
}

#[test]
fn group_lookup_returns_the_coordinator_handle() {
    let mut fx = fixture();
    let controller = fx
        .network
        .controller_for_group(&GroupId::new("RINCON_C:3"))
        .unwrap()
        .unwrap();
    assert_eq!(controller.address, OFFICE);
    assert_eq!(controller.room, "Office");
}

#[test]
fn controllers_are_idempotent_between_invalidations() {
    let mut fx = fixture();

    let first = fx.network.controllers().unwrap();
    let second = fx.network.controllers().unwrap();
    assert_eq!(first, second);
    assert_eq!(fx.fetches.borrow().len(), 1, "topology fetched once");

    fx.network.clear_topology();
    let third = fx.network.controllers().unwrap();
    assert_eq!(first, third);
    assert_eq!(fx.fetches.borrow().len(), 2, "invalidation forces a re-fetch");
    assert_eq!(fx.clears.get(), 0, "device set is kept");
}

#[test]
fn rediscover_clears_devices_and_topology() {
    let mut fx = fixture();
    fx.network.controllers().unwrap();

    fx.network.rediscover();
    assert_eq!(fx.clears.get(), 1);

    fx.network.controllers().unwrap();
    assert_eq!(fx.fetches.borrow().len(), 2);
}

struct RecordingInvoker {
    invocations: RefCell<Vec<(Ipv4Addr, String, String)>>,
    fault: Option<u16>,
}

impl RecordingInvoker {
    fn new(fault: Option<u16>) -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            fault,
        }
    }
}

impl ActionInvoker for RecordingInvoker {
    fn invoke(
        &self,
        address: Ipv4Addr,
        service: &str,
        action: &str,
        _arguments: &[(&str, &str)],
    ) -> Result<HashMap<String, String>, InvokeError> {
        self.invocations
            .borrow_mut()
            .push((address, service.to_string(), action.to_string()));
        match self.fault {
            Some(code) => Err(InvokeError::Fault(code)),
            None => Ok(HashMap::from([(
                "CurrentTransportState".to_string(),
                "PLAYING".to_string(),
            )])),
        }
    }
}

#[test]
fn send_routes_actions_to_the_group_coordinator() {
    let mut fx = fixture();
    // Resolved through a follower; the action must still hit the coordinator.
    let controller = fx.network.controller_by_ip(DINING).unwrap();

    let invoker = RecordingInvoker::new(None);
    let values = controller
        .send(&invoker, "AVTransport", "GetTransportInfo", &[("InstanceID", "0")])
        .unwrap();

    assert_eq!(values["CurrentTransportState"], "PLAYING");
    let invocations = invoker.invocations.borrow();
    assert_eq!(
        *invocations,
        vec![(
            KITCHEN,
            "AVTransport".to_string(),
            "GetTransportInfo".to_string()
        )]
    );
}

#[test]
fn send_propagates_device_faults() {
    let mut fx = fixture();
    let controller = fx.network.controller().unwrap().unwrap();

    let invoker = RecordingInvoker::new(Some(718));
    let result = controller.send(&invoker, "AVTransport", "Play", &[]);
    assert!(matches!(result, Err(InvokeError::Fault(718))));
}

#[test]
fn empty_device_set_is_fatal() {
    let mut fx = fixture_with(BTreeSet::new());
    let result = fx.network.controllers();
    assert!(matches!(result, Err(Error::NoDevicesFound)));
}

#[test]
fn discovery_errors_pass_through() {
    struct FailingProvider;
    impl DeviceProvider for FailingProvider {
        fn addresses(&mut self) -> zonehub_discovery::Result<BTreeSet<Ipv4Addr>> {
            Err(DiscoveryError::Network("multicast send failed".to_string()))
        }
        fn clear(&mut self) {}
    }

    let mut network = Network::builder()
        .provider(Box::new(FailingProvider))
        .prober(Box::new(FakeProber))
        .source(Box::new(CountingSource {
            xml: String::new(),
            fetches: Rc::new(RefCell::new(Vec::new())),
        }))
        .build()
        .unwrap();

    assert!(matches!(
        network.controllers(),
        Err(Error::Discovery(_))
    ));
}

#[test]
fn topology_faults_pass_through_and_stay_stale() {
    struct DeadSource;
    impl TopologySource for DeadSource {
        fn fetch(&self, address: Ipv4Addr) -> zonehub_topology::Result<String> {
            Err(TopologyError::SourceUnreachable {
                address,
                message: "connection refused".to_string(),
            })
        }
    }

    let mut network = Network::builder()
        .provider(Box::new(FakeProvider {
            addresses: BTreeSet::from([KITCHEN]),
            clears: Rc::new(Cell::new(0)),
        }))
        .prober(Box::new(FakeProber))
        .source(Box::new(DeadSource))
        .build()
        .unwrap();

    assert!(matches!(network.controllers(), Err(Error::Topology(_))));
    // The failure is not cached; the next call tries again.
    assert!(matches!(network.controllers(), Err(Error::Topology(_))));
}
