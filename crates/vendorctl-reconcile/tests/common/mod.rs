//! Scripted in-memory gateway for reconciler tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vendorctl_api::{
    ApiError, Cluster, ClusterCreation, ClusterStatus, CreateClusterOpts, CustomerChannel,
    CustomerOpts, CustomerRecord, EntitlementValue, VendorApi,
};
use vendorctl_reconcile::{ManualClock, Provider};

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCluster(CreateClusterOpts),
    GetCluster(String),
    GetKubeconfig(String),
    RemoveCluster(String),
    CreateCustomer(CustomerOpts),
    GetCustomer(String, String),
    UpdateCustomer(String, CustomerOpts),
    ArchiveCustomer(String),
}

type Reply<T> = Result<T, ApiError>;

/// Each verb pops its next scripted reply. An empty `get_cluster` queue
/// repeats the last reply, so "always pending" needs a single entry.
#[derive(Default)]
pub struct FakeVendorApi {
    calls: Mutex<Vec<Call>>,
    create_cluster: Mutex<VecDeque<Reply<ClusterCreation>>>,
    get_cluster: Mutex<VecDeque<Reply<Cluster>>>,
    last_cluster: Mutex<Option<Cluster>>,
    kubeconfig: Mutex<VecDeque<Reply<Vec<u8>>>>,
    remove_cluster: Mutex<VecDeque<Reply<()>>>,
    customer: Mutex<VecDeque<Reply<CustomerRecord>>>,
    archive: Mutex<VecDeque<Reply<()>>>,
}

fn pop<T>(queue: &Mutex<VecDeque<Reply<T>>>, verb: &str) -> Reply<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("no scripted reply for {verb}"))
}

impl FakeVendorApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_create_cluster(&self, reply: Reply<ClusterCreation>) -> &Self {
        self.create_cluster.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_get_cluster(&self, reply: Reply<Cluster>) -> &Self {
        self.get_cluster.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_kubeconfig(&self, reply: Reply<Vec<u8>>) -> &Self {
        self.kubeconfig.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_remove_cluster(&self, reply: Reply<()>) -> &Self {
        self.remove_cluster.lock().unwrap().push_back(reply);
        self
    }

    /// Shared by create, get and update customer.
    pub fn on_customer(&self, reply: Reply<CustomerRecord>) -> &Self {
        self.customer.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_archive(&self, reply: Reply<()>) -> &Self {
        self.archive.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VendorApi for FakeVendorApi {
    async fn create_cluster(&self, opts: &CreateClusterOpts) -> Result<ClusterCreation, ApiError> {
        self.record(Call::CreateCluster(opts.clone()));
        pop(&self.create_cluster, "create_cluster")
    }

    async fn get_cluster(&self, id: &str) -> Result<Cluster, ApiError> {
        self.record(Call::GetCluster(id.to_string()));
        let next = self.get_cluster.lock().unwrap().pop_front();
        match next {
            Some(Ok(cluster)) => {
                *self.last_cluster.lock().unwrap() = Some(cluster.clone());
                Ok(cluster)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last_cluster
                .lock()
                .unwrap()
                .clone()
                .expect("no scripted reply for get_cluster")),
        }
    }

    async fn get_cluster_kubeconfig(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        self.record(Call::GetKubeconfig(id.to_string()));
        pop(&self.kubeconfig, "get_cluster_kubeconfig")
    }

    async fn remove_cluster(&self, id: &str) -> Result<(), ApiError> {
        self.record(Call::RemoveCluster(id.to_string()));
        pop(&self.remove_cluster, "remove_cluster")
    }

    async fn create_customer(&self, opts: &CustomerOpts) -> Result<CustomerRecord, ApiError> {
        self.record(Call::CreateCustomer(opts.clone()));
        pop(&self.customer, "create_customer")
    }

    async fn get_customer(&self, app_id: &str, id: &str) -> Result<CustomerRecord, ApiError> {
        self.record(Call::GetCustomer(app_id.to_string(), id.to_string()));
        pop(&self.customer, "get_customer")
    }

    async fn update_customer(
        &self,
        id: &str,
        opts: &CustomerOpts,
    ) -> Result<CustomerRecord, ApiError> {
        self.record(Call::UpdateCustomer(id.to_string(), opts.clone()));
        pop(&self.customer, "update_customer")
    }

    async fn archive_customer(&self, id: &str) -> Result<(), ApiError> {
        self.record(Call::ArchiveCustomer(id.to_string()));
        pop(&self.archive, "archive_customer")
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

/// Provider over `api` with a manual clock.
pub fn provider(api: &Arc<FakeVendorApi>) -> (Provider, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let provider = Provider::with_api(api.clone()).with_clock(clock.clone());
    (provider, clock)
}

pub fn cluster(id: &str, status: &str) -> Cluster {
    Cluster {
        id: id.to_string(),
        name: "quiet-lynx".to_string(),
        distribution: "kind".to_string(),
        version: "1.29.0".to_string(),
        instance_type: "r1.small".to_string(),
        node_count: 1,
        disk_gib: 50,
        status: ClusterStatus::from(status),
        ttl: "1h".to_string(),
    }
}

pub fn created(cluster: Cluster) -> ClusterCreation {
    ClusterCreation {
        cluster: Some(cluster),
        validation: None,
    }
}

pub fn customer_record(app_id: &str, id: &str) -> CustomerRecord {
    CustomerRecord {
        id: id.to_string(),
        name: "Acme".to_string(),
        email: "ops@acme.test".to_string(),
        channels: vec![CustomerChannel {
            id: "ch1".to_string(),
            app_id: app_id.to_string(),
            name: String::new(),
        }],
        expires_at: None,
        license_type: "trial".to_string(),
        entitlements: vec![EntitlementValue {
            name: "testEntitlement".to_string(),
            value: "test_value".to_string(),
        }],
        is_airgap_enabled: false,
        is_embedded_cluster_download_enabled: false,
        is_geoaxis_supported: false,
        is_gitops_supported: false,
        is_helm_vm_download_enabled: false,
        is_identity_service_supported: false,
        is_installer_support_enabled: true,
        is_kots_install_enabled: false,
        is_snapshot_supported: false,
        is_support_bundle_upload_enabled: false,
        is_archived: false,
    }
}
