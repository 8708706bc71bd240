use helm_convert::{Options, ResourceMap, Resource};
use serde_json::json;

fn main() {
    divan::main();
}

fn resources(n: usize) -> ResourceMap {
    ResourceMap::from_resources((0..n).map(|i| {
        serde_json::from_value::<Resource>(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": format!("deploy{i}"),
                "namespace": "staging",
                "annotations": { "helm.sh/hook": "pre-install", "team": "web" },
            },
            "spec": {
                "template": {
                    "metadata": { "annotations": { "helm.sh/hook-weight": "1" } },
                    "spec": {
                        "initContainers": [{ "name": "init", "image": "busybox" }],
                        "containers": [
                            { "name": "app", "image": format!("registry.example.com:5000/app{}:1.{i}", i % 16) },
                            { "name": "proxy", "image": "envoyproxy/envoy:v1.29.1" },
                        ],
                    },
                },
            },
        }))
        .unwrap()
    }))
    .unwrap()
}

#[divan::bench(args = [10, 100, 1000])]
fn convert(bencher: divan::Bencher, n: usize) {
    let options = Options::default();
    bencher
        .with_inputs(|| resources(n))
        .bench_local_values(|mut resources| helm_convert::convert(&options, &mut resources).unwrap());
}
