// 构建脚本: 静态链接 FFmpeg 时补充系统库
fn main() {
    // 仅 Windows MSVC 需要, 其他平台由 pkg-config / vcpkg 提供
    #[cfg(all(target_os = "windows", target_env = "msvc"))]
    {
        // dshow 摄像头采集依赖 OLE 与 VFW
        println!("cargo:rustc-link-lib=dylib=ole32");
        println!("cargo:rustc-link-lib=dylib=oleaut32");
        println!("cargo:rustc-link-lib=dylib=strmiids");
        println!("cargo:rustc-link-lib=dylib=vfw32");

        // FFmpeg 网络层
        println!("cargo:rustc-link-lib=dylib=secur32");
    }
}
