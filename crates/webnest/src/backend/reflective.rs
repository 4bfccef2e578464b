//! Android backend. Drives a companion object shipped with the host
//! application through JNI reflection.
//!
//! No static link to the companion exists. It is located at run time
//! from the host view: resolve the view's class, take its class
//! loader, load a fixed fully qualified class name through it and
//! instantiate the no-argument constructor. Class and instance are
//! retained as global references so they outlive the call scope.
//!
//! A failed lookup or invoke is a build or deployment defect, never a
//! runtime condition, so it aborts the process. Boolean returning
//! configuration methods are the exception: a false return is the
//! companion refusing the setting and surfaces as a typed error.

use std::sync::{Arc, Mutex};

use jni::objects::{GlobalRef, JClass, JObject, JValue};
use jni::{JNIEnv, JavaVM};
use tracing::{debug, error};

use webnest_core::certs;
use webnest_core::config::ResolvedConfig;
use webnest_core::error::{Error, Result};
use webnest_core::types::{BackendKind, Size, SizeHint, Visibility};

use crate::lifecycle::Lifecycle;
use crate::signal::ClosedLatch;

/// Binary name of the companion class, resolved through the host
/// view's class loader.
const COMPANION_CLASS: &str = "io.webnest.WebNestBridge";

/// References retained across calls, cleared at destroy.
struct CompanionState {
    class: Option<GlobalRef>,
    object: Option<GlobalRef>,
    view: Option<GlobalRef>,
}

pub(crate) struct ReflectiveHost {
    vm: JavaVM,
    state: Mutex<CompanionState>,
    window: usize,
    closed: ClosedLatch,
}

fn binding_fault(context: &'static str, err: jni::errors::Error) -> ! {
    error!(context, %err, "companion binding fault");
    std::process::abort();
}

impl ReflectiveHost {
    pub(crate) fn create(config: &ResolvedConfig, _lifecycle: Arc<Lifecycle>) -> Result<Self> {
        if config.vm == 0 {
            return Err(Error::MissingHostHandle("java vm"));
        }
        if config.window == 0 {
            return Err(Error::MissingHostHandle("host view"));
        }

        let vm = unsafe { JavaVM::from_raw(config.vm as *mut jni::sys::JavaVM) }
            .map_err(|e| Error::construction_aborted(e.to_string()))?;

        let state = {
            let mut env = vm
                .attach_current_thread()
                .map_err(|e| Error::construction_aborted(e.to_string()))?;
            let view = unsafe { JObject::from_raw(config.window as jni::sys::jobject) };
            let (class, object) = bind_companion(&mut env, &view);
            let view = env
                .new_global_ref(&view)
                .unwrap_or_else(|e| binding_fault("view reference", e));
            CompanionState {
                class: Some(class),
                object: Some(object),
                view: Some(view),
            }
        };

        let host = Self {
            vm,
            state: Mutex::new(state),
            window: config.window,
            closed: ClosedLatch::new(),
        };

        host.attach_companion()?;
        if let Err(err) = host.apply_transport(config) {
            let _ = host.destroy();
            return Err(err);
        }
        Ok(host)
    }

    pub(crate) fn kind(&self) -> BackendKind {
        BackendKind::Reflective
    }

    pub(crate) fn window(&self) -> usize {
        self.window
    }

    /// Parks the caller until destroy fires the closed latch.
    pub(crate) fn run(&self) -> Result<()> {
        self.closed.wait();
        Ok(())
    }

    pub(crate) fn navigate(&self, url: &str) -> Result<()> {
        let state = self.state.lock().unwrap();
        let Some(object) = state.object.as_ref() else {
            return Ok(());
        };
        debug!(%url, "navigate");
        let mut env = self.attach("navigate");
        let url = env
            .new_string(url)
            .unwrap_or_else(|e| binding_fault("navigate", e));
        env.call_method(
            object.as_obj(),
            "navigate",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&url)],
        )
        .unwrap_or_else(|e| binding_fault("navigate", e));
        Ok(())
    }

    pub(crate) fn set_title(&self, _title: &str) -> Result<()> {
        // The host application owns the activity chrome.
        Ok(())
    }

    pub(crate) fn set_size(&self, _size: Size, _hint: SizeHint) -> Result<()> {
        // The companion view fills whatever the host gives it.
        Ok(())
    }

    pub(crate) fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        match visibility {
            Visibility::Minimized => self.invoke_void("hide", "()V"),
            _ => Ok(()),
        }
    }

    /// Asks the companion to drop its view, then parks the caller until
    /// destroy fires the closed latch.
    pub(crate) fn hibernate(&self) -> Result<()> {
        self.invoke_void("hide", "()V")?;
        self.invoke_void("hibernate", "()V")?;
        self.closed.wait();
        Ok(())
    }

    /// Re-attaches the companion view after a hibernation.
    pub(crate) fn resume(&self) -> Result<()> {
        self.attach_companion()
    }

    pub(crate) fn terminate(&self) -> Result<()> {
        // The companion has no quit notion short of destroy. The host
        // activity decides when the view goes away.
        debug!("terminate ignored by the reflective backend");
        Ok(())
    }

    /// Clears the retained references under the mutex and fires the
    /// closed latch. Runs immediately, not queued.
    pub(crate) fn destroy(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(object) = state.object.take() {
            let mut env = self.attach("destroy");
            env.call_method(object.as_obj(), "destroy", "()V", &[])
                .unwrap_or_else(|e| binding_fault("destroy", e));
            state.class = None;
            state.view = None;
        }
        drop(state);
        self.closed.fire();
        Ok(())
    }

    pub(crate) fn vibrate(&self, millis: i64) -> Result<()> {
        let state = self.state.lock().unwrap();
        let Some(object) = state.object.as_ref() else {
            return Ok(());
        };
        let mut env = self.attach("vibrate");
        env.call_method(object.as_obj(), "vibrate", "(J)V", &[JValue::Long(millis)])
            .unwrap_or_else(|e| binding_fault("vibrate", e));
        Ok(())
    }

    pub(crate) fn acquire_wake_lock(&self) -> Result<()> {
        self.invoke_void("acquireWakeLock", "()V")
    }

    /// Hands the companion its view. Used at construction and again
    /// when resuming, where it re-attaches.
    fn attach_companion(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        let (Some(object), Some(view)) = (state.object.as_ref(), state.view.as_ref()) else {
            return Ok(());
        };
        let mut env = self.attach("create");
        env.call_method(
            object.as_obj(),
            "create",
            "(Landroid/view/View;)V",
            &[JValue::Object(view.as_obj())],
        )
        .unwrap_or_else(|e| binding_fault("create", e));
        Ok(())
    }

    fn apply_transport(&self, config: &ResolvedConfig) -> Result<()> {
        let transport = &config.transport;
        if !transport.proxy.is_empty() {
            let accepted = self.invoke_bool(
                "setProxy",
                "(Ljava/lang/String;I)Z",
                &transport.proxy.host,
                transport.proxy.port as i32,
            );
            if !accepted {
                return Err(Error::ProxyRefused);
            }
        }
        if !transport.certificate_authorities.is_empty() {
            let blob = certs::reflective_blob(&transport.certificate_authorities);
            let state = self.state.lock().unwrap();
            let Some(object) = state.object.as_ref() else {
                return Ok(());
            };
            let mut env = self.attach("setCerts");
            let blob = env
                .new_string(&blob)
                .unwrap_or_else(|e| binding_fault("setCerts", e));
            let accepted = env
                .call_method(
                    object.as_obj(),
                    "setCerts",
                    "(Ljava/lang/String;)Z",
                    &[JValue::Object(&blob)],
                )
                .and_then(|value| value.z())
                .unwrap_or_else(|e| binding_fault("setCerts", e));
            if !accepted {
                return Err(Error::CertificatesRefused);
            }
        }
        Ok(())
    }

    fn invoke_void(&self, name: &'static str, signature: &'static str) -> Result<()> {
        let state = self.state.lock().unwrap();
        let Some(object) = state.object.as_ref() else {
            return Ok(());
        };
        let mut env = self.attach(name);
        env.call_method(object.as_obj(), name, signature, &[])
            .unwrap_or_else(|e| binding_fault(name, e));
        Ok(())
    }

    fn invoke_bool(
        &self,
        name: &'static str,
        signature: &'static str,
        text: &str,
        number: i32,
    ) -> bool {
        let state = self.state.lock().unwrap();
        let Some(object) = state.object.as_ref() else {
            return true;
        };
        let mut env = self.attach(name);
        let text = env
            .new_string(text)
            .unwrap_or_else(|e| binding_fault(name, e));
        env.call_method(
            object.as_obj(),
            name,
            signature,
            &[JValue::Object(&text), JValue::Int(number)],
        )
        .and_then(|value| value.z())
        .unwrap_or_else(|e| binding_fault(name, e))
    }

    fn attach(&self, context: &'static str) -> jni::AttachGuard<'_> {
        self.vm
            .attach_current_thread()
            .unwrap_or_else(|e| binding_fault(context, e))
    }
}

/// Resolves and instantiates the companion through the view's class
/// loader. Any failure here aborts the process.
fn bind_companion(env: &mut JNIEnv<'_>, view: &JObject<'_>) -> (GlobalRef, GlobalRef) {
    let view_class = env
        .get_object_class(view)
        .unwrap_or_else(|e| binding_fault("view class", e));
    let loader = env
        .call_method(
            &view_class,
            "getClassLoader",
            "()Ljava/lang/ClassLoader;",
            &[],
        )
        .and_then(|value| value.l())
        .unwrap_or_else(|e| binding_fault("class loader", e));
    let name = env
        .new_string(COMPANION_CLASS)
        .unwrap_or_else(|e| binding_fault("companion name", e));
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&name)],
        )
        .and_then(|value| value.l())
        .unwrap_or_else(|e| binding_fault("companion class", e));
    let class = JClass::from(class);
    let object = env
        .new_object(&class, "()V", &[])
        .unwrap_or_else(|e| binding_fault("companion constructor", e));

    let class = env
        .new_global_ref(&class)
        .unwrap_or_else(|e| binding_fault("companion class reference", e));
    let object = env
        .new_global_ref(&object)
        .unwrap_or_else(|e| binding_fault("companion reference", e));
    (class, object)
}
